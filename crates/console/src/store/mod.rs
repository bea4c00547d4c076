//! Client-side state container.
//!
//! Actions go through one pure reducer ([`AppState::reduce`]) and every
//! applied action publishes a fresh `Arc<AppState>` on a `watch` channel.
//! Dispatch is serialized by the channel; refused actions publish nothing.

mod collection;
mod state;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use omnicorp_auth::{Credential, SessionEpoch, SessionRejection};

use crate::http::CredentialSource;

pub use collection::{Collection, CollectionAction, CollectionStatus, OperationKind, Ticket};
pub use state::{Action, AppState};

/// Why the reducer refused an action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreRejection {
    #[error(transparent)]
    Session(#[from] SessionRejection),

    #[error("stale {kind:?} result from session {got} (current {current})")]
    StaleEpoch {
        kind: OperationKind,
        got: SessionEpoch,
        current: SessionEpoch,
    },

    #[error("fetch #{got} superseded by fetch #{latest}")]
    SupersededFetch { got: u64, latest: u64 },
}

/// Result of one dispatch: the state right after it, and whether the action
/// was applied.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub snapshot: Arc<AppState>,
    pub outcome: Result<(), StoreRejection>,
}

impl Dispatch {
    pub fn applied(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<Arc<AppState>>>,
}

impl core::fmt::Debug for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Store")
            .field("receivers", &self.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.tx.borrow().clone()
    }

    /// Receives the latest snapshot after each applied action.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.tx.subscribe()
    }

    pub fn dispatch(&self, action: Action) -> Dispatch {
        let mut outcome = Ok(());
        let mut snapshot = None;

        self.tx.send_if_modified(|state| {
            let modified = match state.reduce(&action) {
                Ok(next) => {
                    *state = Arc::new(next);
                    true
                }
                Err(rejection) => {
                    outcome = Err(rejection);
                    false
                }
            };
            snapshot = Some(state.clone());
            modified
        });

        match &outcome {
            Ok(()) => tracing::trace!(target_slice = action.target(), action = action.name(), "applied"),
            Err(rejection) => tracing::debug!(
                target_slice = action.target(),
                action = action.name(),
                reason = %rejection,
                "discarded"
            ),
        }

        Dispatch {
            snapshot: snapshot.unwrap_or_else(|| self.snapshot()),
            outcome,
        }
    }
}

impl CredentialSource for Store {
    fn current_credential(&self) -> Option<Credential> {
        self.tx.borrow().session.credential().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnicorp_auth::{SessionEvent, SessionStatus};

    #[tokio::test]
    async fn subscribers_see_applied_actions_only() {
        let store = Store::new();
        let mut rx = store.subscribe();

        let d = store.dispatch(Action::Session(SessionEvent::LoginStarted));
        assert!(d.applied());
        assert_eq!(d.snapshot.session.status(), SessionStatus::Pending);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().session.status(), SessionStatus::Pending);

        let refused = store.dispatch(Action::Session(SessionEvent::LoginStarted));
        assert!(!refused.applied());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn credential_source_reads_the_live_session() {
        let store = Store::new();
        assert_eq!(store.current_credential(), None);

        let credential = Credential::new("persisted").unwrap();
        store.dispatch(Action::Session(SessionEvent::RestoreStarted {
            credential: credential.clone(),
        }));
        assert_eq!(store.current_credential(), Some(credential));
    }
}
