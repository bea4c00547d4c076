//! Wires store, HTTP client, credential storage and policy together.

use std::sync::Arc;

use omnicorp_auth::{AdminPolicy, GuardDecision};

use crate::config::{ApiRoutes, ConsoleConfig};
use crate::credentials::CredentialStore;
use crate::dashboard::{self, Dashboard};
use crate::http::ApiClient;
use crate::navigation::{self, Sidebar};
use crate::resource::{Modules, Permissions, Profiles, Users};
use crate::session::{self, SessionService};
use crate::slice::CrudSlice;
use crate::store::{AppState, Store};

/// One running admin console.
#[derive(Clone)]
pub struct Console {
    store: Store,
    api: ApiClient,
    routes: Arc<ApiRoutes>,
    policy: Arc<AdminPolicy>,
    credentials: Arc<dyn CredentialStore>,
}

impl core::fmt::Debug for Console {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Console")
            .field("api", &self.api)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(config: ConsoleConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_http_client(config, credentials, reqwest::Client::new())
    }

    pub fn with_http_client(
        config: ConsoleConfig,
        credentials: Arc<dyn CredentialStore>,
        http: reqwest::Client,
    ) -> Self {
        let store = Store::new();
        let api = ApiClient::with_http_client(http, &config.api_url, Arc::new(store.clone()));
        api.on_transport_event(session::invalidate_on_unauthorized(
            store.clone(),
            Arc::clone(&credentials),
        ));

        Self {
            store,
            api,
            routes: Arc::new(config.routes),
            policy: Arc::new(config.policy),
            credentials,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.store.snapshot()
    }

    pub fn session(&self) -> SessionService {
        SessionService::new(
            self.store.clone(),
            self.api.clone(),
            Arc::clone(&self.routes),
            Arc::clone(&self.credentials),
        )
    }

    pub fn users(&self) -> CrudSlice<Users> {
        self.slice()
    }

    pub fn profiles(&self) -> CrudSlice<Profiles> {
        self.slice()
    }

    pub fn permissions(&self) -> CrudSlice<Permissions> {
        self.slice()
    }

    pub fn modules(&self) -> CrudSlice<Modules> {
        self.slice()
    }

    pub fn guard(&self) -> GuardDecision {
        omnicorp_auth::guard(&self.snapshot().session)
    }

    pub fn is_admin(&self) -> bool {
        self.policy.authorize(&self.snapshot().session).is_ok()
    }

    pub fn sidebar(&self) -> Sidebar {
        navigation::sidebar(&self.snapshot(), &self.policy)
    }

    pub fn dashboard(&self) -> Dashboard {
        dashboard::dashboard(&self.snapshot().session)
    }

    fn slice<R: crate::resource::Resource>(&self) -> CrudSlice<R> {
        CrudSlice::new(self.store.clone(), self.api.clone(), Arc::clone(&self.routes))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Console {
    /// Native console persisting its credential where the configuration says,
    /// or only in memory when no location is known.
    pub fn from_config(config: ConsoleConfig) -> Self {
        let credentials: Arc<dyn CredentialStore> = match &config.credential_path {
            Some(path) => Arc::new(crate::credentials::FileCredentialStore::new(path)),
            None => Arc::new(crate::credentials::MemoryCredentialStore::new()),
        };
        Self::new(config, credentials)
    }
}

#[cfg(target_arch = "wasm32")]
impl Console {
    /// Browser console persisting its credential in `localStorage`.
    pub fn from_config(config: ConsoleConfig) -> Self {
        Self::new(
            config,
            Arc::new(crate::credentials::LocalStorageCredentialStore),
        )
    }
}
