//! One entity collection and its reducer.

use serde::Serialize;

use omnicorp_auth::SessionEpoch;
use omnicorp_core::Entity;

use super::StoreRejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Fetch,
    Create,
    Update,
    Delete,
    /// Attach or detach a permission on a profile.
    Link,
}

/// Identifies one started operation. Its settlement must present the same
/// ticket back so late results can be recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub epoch: SessionEpoch,
    pub sequence: u64,
    pub kind: OperationKind,
}

/// Items of one kind mirrored from the backend.
///
/// # Invariants
/// - `items` are unique by id and keep server order.
/// - `last_error` is cleared when an operation starts and only set on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<E> {
    items: Vec<E>,
    status: CollectionStatus,
    last_error: Option<String>,
    sequence: u64,
    latest_fetch: u64,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: CollectionStatus::Idle,
            last_error: None,
            sequence: 0,
            latest_fetch: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionAction<E: Entity> {
    Started { kind: OperationKind },
    Fetched { ticket: Ticket, items: Vec<E> },
    Created { ticket: Ticket, item: E },
    Updated { ticket: Ticket, item: E },
    Deleted { ticket: Ticket, id: E::Id },
    Failed { ticket: Ticket, message: String },
    /// Local validation refused the payload before any request.
    Invalid { message: String },
    ErrorCleared,
}

impl<E: Entity> CollectionAction<E> {
    pub fn name(&self) -> &'static str {
        match self {
            CollectionAction::Started { .. } => "started",
            CollectionAction::Fetched { .. } => "fetched",
            CollectionAction::Created { .. } => "created",
            CollectionAction::Updated { .. } => "updated",
            CollectionAction::Deleted { .. } => "deleted",
            CollectionAction::Failed { .. } => "failed",
            CollectionAction::Invalid { .. } => "invalid",
            CollectionAction::ErrorCleared => "error_cleared",
        }
    }
}

impl<E: Entity + Clone> Collection<E> {
    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn status(&self) -> CollectionStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == CollectionStatus::Loading
    }

    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.items.iter().find(|e| e.id() == id)
    }

    /// The ticket for the operation most recently started on this collection.
    pub fn last_ticket(&self, kind: OperationKind, epoch: SessionEpoch) -> Ticket {
        Ticket {
            epoch,
            sequence: self.sequence,
            kind,
        }
    }

    /// Reduce one action. `epoch` is the session epoch current when the action
    /// is applied.
    pub fn apply(
        &self,
        action: &CollectionAction<E>,
        epoch: SessionEpoch,
    ) -> Result<Collection<E>, StoreRejection> {
        let mut next = self.clone();
        match action {
            CollectionAction::Started { kind } => {
                next.sequence += 1;
                if *kind == OperationKind::Fetch {
                    next.latest_fetch = next.sequence;
                }
                next.status = CollectionStatus::Loading;
                next.last_error = None;
            }

            CollectionAction::Fetched { ticket, items } => {
                self.check_epoch(ticket, epoch)?;
                self.check_latest_fetch(ticket)?;
                next.items = dedup_by_id(items);
                next.status = CollectionStatus::Succeeded;
            }

            CollectionAction::Created { ticket, item } => {
                self.check_epoch(ticket, epoch)?;
                match next.items.iter_mut().find(|e| e.id() == item.id()) {
                    Some(existing) => *existing = item.clone(),
                    None => next.items.push(item.clone()),
                }
                next.status = CollectionStatus::Succeeded;
            }

            CollectionAction::Updated { ticket, item } => {
                self.check_epoch(ticket, epoch)?;
                if let Some(existing) = next.items.iter_mut().find(|e| e.id() == item.id()) {
                    *existing = item.clone();
                }
                next.status = CollectionStatus::Succeeded;
            }

            CollectionAction::Deleted { ticket, id } => {
                self.check_epoch(ticket, epoch)?;
                next.items.retain(|e| e.id() != *id);
                next.status = CollectionStatus::Succeeded;
            }

            // Failures only touch status and message, so they are still
            // recorded after the session moved on.
            CollectionAction::Failed { ticket, message } => {
                self.check_latest_fetch(ticket)?;
                next.status = CollectionStatus::Failed;
                next.last_error = Some(message.clone());
            }

            CollectionAction::Invalid { message } => {
                next.status = CollectionStatus::Failed;
                next.last_error = Some(message.clone());
            }

            CollectionAction::ErrorCleared => {
                next.last_error = None;
            }
        }
        Ok(next)
    }

    /// Called when a new session epoch opens: nothing in flight will land.
    pub(crate) fn abandon_in_flight(&mut self) {
        if self.status == CollectionStatus::Loading {
            self.status = CollectionStatus::Idle;
        }
    }

    fn check_epoch(&self, ticket: &Ticket, current: SessionEpoch) -> Result<(), StoreRejection> {
        if ticket.epoch != current {
            return Err(StoreRejection::StaleEpoch {
                kind: ticket.kind,
                got: ticket.epoch,
                current,
            });
        }
        Ok(())
    }

    fn check_latest_fetch(&self, ticket: &Ticket) -> Result<(), StoreRejection> {
        if ticket.kind == OperationKind::Fetch && ticket.sequence != self.latest_fetch {
            return Err(StoreRejection::SupersededFetch {
                got: ticket.sequence,
                latest: self.latest_fetch,
            });
        }
        Ok(())
    }
}

/// Keeps the first occurrence of every id, in order.
fn dedup_by_id<E: Entity + Clone>(items: &[E]) -> Vec<E> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|e| seen.insert(e.id()))
        .cloned()
        .collect()
}
