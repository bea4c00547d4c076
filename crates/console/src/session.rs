//! Session operations: login, logout, restore, refresh.
//!
//! Every operation captures the session epoch it started in; results that
//! arrive after a logout or a newer login are refused by the store and never
//! touch the persisted credential.

use std::sync::Arc;

use omnicorp_auth::{Credential, SessionEpoch, SessionEvent};
use omnicorp_core::User;

use crate::config::ApiRoutes;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, ApiResult};
use crate::http::{ApiClient, TransportEvent};
use crate::store::{Action, Dispatch, Store};

/// A restore started by [`SessionService::begin_restore`], not yet checked
/// with the backend.
#[derive(Debug)]
pub struct PendingRestore {
    epoch: SessionEpoch,
    credential: Credential,
}

impl PendingRestore {
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Store,
    api: ApiClient,
    routes: Arc<ApiRoutes>,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionService {
    pub fn new(
        store: Store,
        api: ApiClient,
        routes: Arc<ApiRoutes>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            store,
            api,
            routes,
            credentials,
        }
    }

    /// Exchanges username/password for a credential, then loads the user it
    /// belongs to. The credential is persisted only once both steps succeed.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let epoch = self.start(SessionEvent::LoginStarted)?;
        tracing::info!(username, "login started");

        let result = async {
            let token = self
                .api
                .exchange_credentials(&self.routes.token, username, password)
                .await?;
            let credential =
                Credential::new(token.access_token).map_err(|e| ApiError::Decode(e.to_string()))?;

            self.dispatch(SessionEvent::CredentialIssued {
                epoch,
                credential: credential.clone(),
            });

            let user = self.api.current_user(&self.routes.me, &credential).await?;
            Ok::<_, ApiError>((credential, user))
        }
        .await;

        match result {
            Ok((credential, user)) => {
                let applied = self.dispatch(SessionEvent::Authenticated {
                    epoch,
                    credential: credential.clone(),
                    user: user.clone(),
                });
                if !applied.applied() {
                    return Err(superseded("login"));
                }

                persist(self.credentials.as_ref(), &credential);
                // A logout may have landed while the credential was written.
                if self.store.snapshot().session.epoch() != epoch {
                    forget(self.credentials.as_ref());
                    return Err(superseded("login"));
                }

                tracing::info!(username = %user.username, "authenticated");
                Ok(user)
            }
            Err(err) => {
                let rejected = self.dispatch(SessionEvent::LoginRejected {
                    epoch,
                    message: err.message(),
                });
                if rejected.applied() {
                    forget(self.credentials.as_ref());
                    tracing::info!(username, error = %err, "login rejected");
                }
                Err(err)
            }
        }
    }

    /// Always succeeds locally.
    pub fn logout(&self) {
        self.dispatch(SessionEvent::LoggedOut);
        forget(self.credentials.as_ref());
        tracing::info!("logged out");
    }

    /// Startup check of a persisted credential.
    ///
    /// `Ok(None)` when nothing usable is stored. On failure the credential is
    /// discarded and the session stays anonymous.
    pub async fn restore_session(&self) -> ApiResult<Option<User>> {
        match self.begin_restore()? {
            Some(pending) => self.complete_restore(pending).await.map(Some),
            None => Ok(None),
        }
    }

    /// Synchronous half of [`restore_session`](Self::restore_session): loads
    /// the stored credential and moves the session to `Pending`, so a guard
    /// evaluated right after waits instead of redirecting to the login page.
    pub fn begin_restore(&self) -> ApiResult<Option<PendingRestore>> {
        let credential = match self.credentials.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => return Ok(None),
            Err(err) => {
                tracing::error!(error = %err, "could not read stored credential");
                return Ok(None);
            }
        };

        let epoch = self.start(SessionEvent::RestoreStarted {
            credential: credential.clone(),
        })?;
        Ok(Some(PendingRestore { epoch, credential }))
    }

    /// Verifies a pending restore against the backend.
    pub async fn complete_restore(&self, pending: PendingRestore) -> ApiResult<User> {
        let PendingRestore { epoch, credential } = pending;

        match self.api.current_user(&self.routes.me, &credential).await {
            Ok(user) => {
                let applied = self.dispatch(SessionEvent::Authenticated {
                    epoch,
                    credential,
                    user: user.clone(),
                });
                if !applied.applied() {
                    return Err(superseded("restore"));
                }
                tracing::info!(username = %user.username, "session restored");
                Ok(user)
            }
            Err(err) => {
                self.drop_session(epoch, "restore", &err);
                Err(err)
            }
        }
    }

    /// Re-reads the current user for an authenticated session. A failure ends
    /// the session like a failed restore.
    pub async fn refresh_current_user(&self) -> ApiResult<User> {
        let snapshot = self.store.snapshot();
        if !snapshot.session.is_authenticated() {
            return Err(ApiError::SessionConflict("not authenticated".to_string()));
        }
        let epoch = snapshot.session.epoch();

        match self.api.get::<User>(&self.routes.me).await {
            Ok(user) => {
                let applied = self.dispatch(SessionEvent::UserRefreshed {
                    epoch,
                    user: user.clone(),
                });
                if !applied.applied() {
                    return Err(superseded("refresh"));
                }
                Ok(user)
            }
            Err(err) => {
                self.drop_session(epoch, "refresh", &err);
                Err(err)
            }
        }
    }

    /// Acknowledges a rejected login.
    pub fn dismiss_error(&self) {
        self.dispatch(SessionEvent::ErrorDismissed);
    }

    fn start(&self, event: SessionEvent) -> ApiResult<SessionEpoch> {
        let d = self.store.dispatch(Action::Session(event));
        match d.outcome {
            Ok(()) => Ok(d.snapshot.session.epoch()),
            Err(rejection) => Err(ApiError::SessionConflict(rejection.to_string())),
        }
    }

    fn dispatch(&self, event: SessionEvent) -> Dispatch {
        self.store.dispatch(Action::Session(event))
    }

    fn drop_session(&self, epoch: SessionEpoch, operation: &str, err: &ApiError) {
        if self.dispatch(SessionEvent::RestoreFailed { epoch }).applied() {
            forget(self.credentials.as_ref());
            tracing::warn!(operation, error = %err, "stored credential rejected, session dropped");
        }
    }
}

/// Listener for [`TransportEvent`]s: any 401 on a resource request ends the
/// session and discards the persisted credential.
///
/// Holds only the store and the credential store so the client that emits
/// the events is not kept alive by its own listener.
pub(crate) fn invalidate_on_unauthorized(
    store: Store,
    credentials: Arc<dyn CredentialStore>,
) -> impl Fn(&TransportEvent) + Send + Sync + 'static {
    move |event| match event {
        TransportEvent::Unauthorized { method, path } => {
            store.dispatch(Action::Session(SessionEvent::Invalidated));
            forget(credentials.as_ref());
            tracing::warn!(%method, %path, "backend answered 401, session invalidated");
        }
    }
}

fn persist(credentials: &dyn CredentialStore, credential: &Credential) {
    if let Err(err) = credentials.save(credential) {
        tracing::error!(error = %err, "could not persist credential");
    }
}

fn forget(credentials: &dyn CredentialStore) {
    if let Err(err) = credentials.clear() {
        tracing::error!(error = %err, "could not clear stored credential");
    }
}

fn superseded(operation: &str) -> ApiError {
    ApiError::SessionConflict(format!("{operation} superseded by a newer session change"))
}
