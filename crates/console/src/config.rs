//! Console configuration, read from the environment with defaults.

use std::path::PathBuf;

use omnicorp_auth::{AdminPolicy, RoleName};

/// Backend used when nothing else is configured on native targets.
pub const DEFAULT_NATIVE_API_URL: &str = "http://localhost:8000";

/// Which route family serves the profile (role) collection.
///
/// Two backend generations exist; both speak the same payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolesEndpoint {
    #[default]
    Profiles,
    Roles,
}

impl RolesEndpoint {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "profiles" => Some(Self::Profiles),
            "roles" => Some(Self::Roles),
            _ => None,
        }
    }

    fn collection_path(self) -> &'static str {
        match self {
            RolesEndpoint::Profiles => "/api/profiles",
            RolesEndpoint::Roles => "/api/roles",
        }
    }
}

/// Relative paths of every backend route the console talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    pub token: String,
    pub me: String,
    pub users: String,
    /// Assignable roles, served under the user routes.
    pub user_roles: String,
    pub profiles: String,
    pub permissions: String,
    pub modules: String,
}

impl ApiRoutes {
    pub fn new(roles: RolesEndpoint) -> Self {
        Self {
            token: "/api/auth/token".to_string(),
            me: "/api/auth/me".to_string(),
            users: "/api/users/".to_string(),
            user_roles: "/api/users/roles/".to_string(),
            profiles: roles.collection_path().to_string(),
            permissions: "/api/permissions".to_string(),
            modules: "/api/modules/".to_string(),
        }
    }

    /// `collection` + `/{id}`, regardless of whether the collection route ends
    /// with a slash.
    pub fn item(collection: &str, id: impl core::fmt::Display) -> String {
        format!("{}/{}", collection.trim_end_matches('/'), id)
    }
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self::new(RolesEndpoint::default())
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend origin, without a trailing slash.
    pub api_url: String,
    pub routes: ApiRoutes,
    pub policy: AdminPolicy,
    /// Where the native binary persists the credential. `None` keeps it in
    /// memory only.
    pub credential_path: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_base(&api_url.into()),
            routes: ApiRoutes::default(),
            policy: AdminPolicy::default(),
            credential_path: None,
        }
    }

    pub fn with_routes(mut self, routes: ApiRoutes) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_policy(mut self, policy: AdminPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = Some(path.into());
        self
    }

    /// Process environment first, then the values compiled in with
    /// [`build_time`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        Self::from_lookup(overlay(|key| std::env::var(key).ok()))
    }

    /// The browser has no process environment; only values fixed at build
    /// time (`OMNICORP_API_URL=https://... trunk build`) apply.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Self {
        Self::from_lookup(overlay(|_| None))
    }

    /// Builds the configuration from any key lookup (the process environment
    /// in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("OMNICORP_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_api_url);

        let roles = match lookup("OMNICORP_ROLES_ENDPOINT") {
            Some(raw) => RolesEndpoint::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "unknown OMNICORP_ROLES_ENDPOINT, using profiles");
                RolesEndpoint::Profiles
            }),
            None => RolesEndpoint::Profiles,
        };

        let admin_role = lookup("OMNICORP_ADMIN_ROLE")
            .filter(|v| !v.trim().is_empty())
            .map(RoleName::new)
            .unwrap_or(RoleName::ADMIN);

        // Unset keeps the fallback account; an empty value disables it.
        let fallback = match lookup("OMNICORP_FALLBACK_ADMIN") {
            Some(name) => Some(name),
            None => AdminPolicy::default().fallback_username().map(str::to_string),
        };

        let credential_path = lookup("OMNICORP_CREDENTIAL_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_credential_path);

        Self {
            api_url: normalize_base(&api_url),
            routes: ApiRoutes::new(roles),
            policy: AdminPolicy::new(admin_role, fallback),
            credential_path,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Configuration captured from the environment of the build.
pub fn build_time(key: &str) -> Option<&'static str> {
    match key {
        "OMNICORP_API_URL" => option_env!("OMNICORP_API_URL"),
        "OMNICORP_ROLES_ENDPOINT" => option_env!("OMNICORP_ROLES_ENDPOINT"),
        "OMNICORP_ADMIN_ROLE" => option_env!("OMNICORP_ADMIN_ROLE"),
        "OMNICORP_FALLBACK_ADMIN" => option_env!("OMNICORP_FALLBACK_ADMIN"),
        "OMNICORP_CREDENTIAL_PATH" => option_env!("OMNICORP_CREDENTIAL_PATH"),
        _ => None,
    }
}

fn overlay(runtime: impl Fn(&str) -> Option<String>) -> impl Fn(&str) -> Option<String> {
    move |key| runtime(key).or_else(|| build_time(key).map(str::to_string))
}

fn normalize_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(not(target_arch = "wasm32"))]
fn default_api_url() -> String {
    DEFAULT_NATIVE_API_URL.to_string()
}

/// Same origin as the page that loaded the console.
#[cfg(target_arch = "wasm32")]
fn default_api_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn default_credential_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("omnicorp").join("credential"))
}

#[cfg(target_arch = "wasm32")]
fn default_credential_path() -> Option<PathBuf> {
    None
}
