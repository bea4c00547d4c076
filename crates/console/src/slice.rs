//! Generic CRUD synchronization between a REST collection and its store slice.
//!
//! Every operation dispatches `Started` before the request and exactly one
//! settlement action after it. The store decides whether a settlement still
//! applies (see [`crate::store::StoreRejection`]); the caller always gets the
//! backend's answer.

use std::marker::PhantomData;
use std::sync::Arc;

use omnicorp_core::{Draft, Entity, PermissionId, Profile, ProfileId, RoleSummary};

use crate::config::ApiRoutes;
use crate::error::{ApiError, ApiResult};
use crate::http::ApiClient;
use crate::resource::{Profiles, Resource, Updatable, Users};
use crate::store::{Action, Collection, CollectionAction, OperationKind, Store, Ticket};

pub struct CrudSlice<R: Resource> {
    store: Store,
    api: ApiClient,
    routes: Arc<ApiRoutes>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for CrudSlice<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            api: self.api.clone(),
            routes: Arc::clone(&self.routes),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> CrudSlice<R> {
    pub fn new(store: Store, api: ApiClient, routes: Arc<ApiRoutes>) -> Self {
        Self {
            store,
            api,
            routes,
            _resource: PhantomData,
        }
    }

    /// Current contents of the slice.
    pub fn collection(&self) -> Collection<R::Entity> {
        R::collection(&self.store.snapshot()).clone()
    }

    pub fn items(&self) -> Vec<R::Entity> {
        R::collection(&self.store.snapshot()).items().to_vec()
    }

    /// Replaces the slice with the server's list, in server order.
    pub async fn fetch_all(&self) -> ApiResult<Vec<R::Entity>> {
        let ticket = self.begin(OperationKind::Fetch);
        let result = self
            .api
            .get::<Vec<R::Entity>>(R::collection_path(&self.routes))
            .await;

        let items = self.settle(ticket, result)?;
        tracing::debug!(resource = R::NAME, count = items.len(), "fetched");
        self.store.dispatch(R::wrap(CollectionAction::Fetched {
            ticket,
            items: items.clone(),
        }));
        Ok(items)
    }

    pub async fn create(&self, draft: &R::Draft) -> ApiResult<R::Entity> {
        self.validate(draft)?;

        let ticket = self.begin(OperationKind::Create);
        let result = self
            .api
            .post::<_, R::Entity>(R::collection_path(&self.routes), draft)
            .await;

        let item = self.settle(ticket, result)?;
        tracing::info!(resource = R::NAME, id = %item.id(), "created");
        self.store.dispatch(R::wrap(CollectionAction::Created {
            ticket,
            item: item.clone(),
        }));
        Ok(item)
    }

    pub async fn delete(&self, id: <R::Entity as Entity>::Id) -> ApiResult<()> {
        let ticket = self.begin(OperationKind::Delete);
        let result = self.api.delete(&self.item_path(id)).await;

        self.settle(ticket, result)?;
        tracing::info!(resource = R::NAME, %id, "deleted");
        self.store.dispatch(R::wrap(CollectionAction::Deleted { ticket, id }));
        Ok(())
    }

    /// Asks `confirm` first; a declined prompt sends nothing and returns
    /// `Ok(false)`.
    pub async fn delete_confirmed(
        &self,
        id: <R::Entity as Entity>::Id,
        confirm: impl FnOnce(Option<&R::Entity>) -> bool,
    ) -> ApiResult<bool> {
        let snapshot = self.store.snapshot();
        if !confirm(R::collection(&snapshot).get(id)) {
            tracing::debug!(resource = R::NAME, %id, "delete declined");
            return Ok(false);
        }
        self.delete(id).await.map(|()| true)
    }

    pub fn clear_error(&self) {
        self.store.dispatch(R::wrap(CollectionAction::ErrorCleared));
    }

    fn begin(&self, kind: OperationKind) -> Ticket {
        let d = self.store.dispatch(R::wrap(CollectionAction::Started { kind }));
        R::collection(&d.snapshot).last_ticket(kind, d.snapshot.session.epoch())
    }

    /// Records a failure on the slice and hands the result back.
    fn settle<T>(&self, ticket: Ticket, result: ApiResult<T>) -> ApiResult<T> {
        result.inspect_err(|err| {
            tracing::debug!(resource = R::NAME, kind = ?ticket.kind, error = %err, "operation failed");
            self.store.dispatch(R::wrap(CollectionAction::Failed {
                ticket,
                message: err.message(),
            }));
        })
    }

    fn validate(&self, draft: &impl Draft) -> ApiResult<()> {
        draft.validate().map_err(|err| {
            let err = ApiError::from(err);
            self.store.dispatch(R::wrap(CollectionAction::Invalid {
                message: err.message(),
            }));
            err
        })
    }

    fn item_path(&self, id: <R::Entity as Entity>::Id) -> String {
        ApiRoutes::item(R::collection_path(&self.routes), id)
    }
}

impl<R: Updatable> CrudSlice<R> {
    /// Replaces the matching local item with the server's copy. An id the
    /// slice does not hold leaves the items untouched.
    pub async fn update(
        &self,
        id: <R::Entity as Entity>::Id,
        patch: &R::Patch,
    ) -> ApiResult<R::Entity> {
        self.validate(patch)?;

        let ticket = self.begin(OperationKind::Update);
        let result = self.api.put::<_, R::Entity>(&self.item_path(id), patch).await;

        let item = self.settle(ticket, result)?;
        tracing::info!(resource = R::NAME, %id, "updated");
        self.store.dispatch(R::wrap(CollectionAction::Updated {
            ticket,
            item: item.clone(),
        }));
        Ok(item)
    }
}

impl CrudSlice<Profiles> {
    pub async fn add_permission(
        &self,
        profile: ProfileId,
        permission: PermissionId,
    ) -> ApiResult<Profile> {
        self.link(profile, permission, true).await
    }

    pub async fn remove_permission(
        &self,
        profile: ProfileId,
        permission: PermissionId,
    ) -> ApiResult<Profile> {
        self.link(profile, permission, false).await
    }

    /// The link endpoints answer with a bare message, so the profile is read
    /// back afterwards.
    async fn link(
        &self,
        profile: ProfileId,
        permission: PermissionId,
        attach: bool,
    ) -> ApiResult<Profile> {
        let ticket = self.begin(OperationKind::Link);
        let profile_path = self.item_path(profile);
        let link_path = format!("{profile_path}/permissions/{permission}");

        let result = async {
            if attach {
                self.api.post_empty(&link_path).await?;
            } else {
                self.api.delete(&link_path).await?;
            }
            self.api.get::<Profile>(&profile_path).await
        }
        .await;

        let updated = self.settle(ticket, result)?;
        tracing::info!(%profile, %permission, attach, "profile permissions changed");
        self.store.dispatch(Profiles::wrap(CollectionAction::Updated {
            ticket,
            item: updated.clone(),
        }));
        Ok(updated)
    }
}

impl CrudSlice<Users> {
    /// Loads the roles a user can be assigned into `AppState::roles`.
    ///
    /// Tracked separately from the user list, so a role fetch never
    /// supersedes a pending user fetch.
    pub async fn fetch_roles(&self) -> ApiResult<Vec<RoleSummary>> {
        let kind = OperationKind::Fetch;
        let d = self.store.dispatch(Action::Roles(CollectionAction::Started { kind }));
        let ticket = d.snapshot.roles.last_ticket(kind, d.snapshot.session.epoch());

        match self.api.get::<Vec<RoleSummary>>(&self.routes.user_roles).await {
            Ok(roles) => {
                tracing::debug!(count = roles.len(), "roles fetched");
                self.store.dispatch(Action::Roles(CollectionAction::Fetched {
                    ticket,
                    items: roles.clone(),
                }));
                Ok(roles)
            }
            Err(err) => {
                tracing::debug!(error = %err, "roles fetch failed");
                self.store.dispatch(Action::Roles(CollectionAction::Failed {
                    ticket,
                    message: err.message(),
                }));
                Err(err)
            }
        }
    }
}
