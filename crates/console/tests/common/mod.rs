//! In-process fake of the OmniCorp REST backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Form, Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Notify;

use omnicorp_console::{Console, ConsoleConfig, CredentialStore, MemoryCredentialStore};
use omnicorp_core::{
    Module, ModuleDraft, ModuleId, Permission, PermissionDraft, PermissionId, Profile,
    ProfileDraft, ProfileId, RoleSummary, User, UserDraft, UserId, UserPatch,
};

/// Holds the next gated request until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct Backend {
    passwords: HashMap<String, String>,
    tokens: HashMap<String, UserId>,
    users: Vec<User>,
    profiles: Vec<Profile>,
    permissions: Vec<Permission>,
    modules: Vec<Module>,
    next_id: i64,
    issued: u64,
    requests: Vec<String>,
    profile_list_gate: Option<Arc<Gate>>,
    me_gate: Option<Arc<Gate>>,
    me_failure: Option<StatusCode>,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<User, Response> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .and_then(|id| self.users.iter().find(|u| u.id == *id))
            .cloned()
            .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    fn resolve(&self, ids: &[PermissionId]) -> Vec<Permission> {
        self.permissions
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect()
    }
}

type Shared = Arc<Mutex<Backend>>;

fn lock(state: &Shared) -> MutexGuard<'_, Backend> {
    state.lock().unwrap()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn message(text: &str) -> Response {
    Json(json!({ "message": text })).into_response()
}

pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        omnicorp_observability::init_for_tests();
        let state: Shared = Arc::new(Mutex::new(Backend::default()));

        let app = Router::new()
            .route("/api/auth/token", post(issue_token))
            .route("/api/auth/me", get(me))
            .route("/api/users/", get(list_users).post(create_user))
            .route("/api/users/roles/", get(list_roles))
            .route("/api/users/:id", put(update_user).delete(delete_user))
            .route("/api/profiles", get(list_profiles).post(create_profile))
            .route(
                "/api/profiles/:id",
                get(get_profile).put(update_profile).delete(delete_profile),
            )
            .route(
                "/api/profiles/:id/permissions/:pid",
                post(link_permission).delete(unlink_permission),
            )
            .route("/api/permissions", get(list_permissions).post(create_permission))
            .route("/api/permissions/:id", delete(delete_permission))
            .route("/api/modules/", get(list_modules).post(create_module))
            .route("/api/modules/:id", put(update_module).delete(delete_module))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn config(&self) -> ConsoleConfig {
        ConsoleConfig::new(&self.base_url)
    }

    /// A fresh console with its own in-memory credential store.
    pub fn console(&self) -> (Console, Arc<MemoryCredentialStore>) {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let console = self.console_with(credentials.clone());
        (console, credentials)
    }

    pub fn console_with(&self, credentials: Arc<dyn CredentialStore>) -> Console {
        Console::new(self.config(), credentials)
    }

    pub fn add_account(&self, username: &str, password: &str, role: Option<&str>) -> User {
        let mut b = lock(&self.state);
        let id = b.next_id();
        let role = role.map(|name| RoleSummary {
            id: ProfileId::new(100 + id),
            name: name.to_string(),
            description: None,
        });
        let user: User = serde_json::from_value(json!({
            "id": id,
            "username": username,
            "full_name": format!("{username} (test)"),
            "email": format!("{username}@omnicorp.test"),
            "role": role,
        }))
        .unwrap();
        b.passwords.insert(username.to_string(), password.to_string());
        b.users.push(user.clone());
        user
    }

    pub fn seed_permission(&self, id: i64, name: &str) -> Permission {
        let permission = Permission {
            id: PermissionId::new(id),
            name: name.to_string(),
            description: None,
        };
        let mut b = lock(&self.state);
        b.next_id = b.next_id.max(id);
        b.permissions.push(permission.clone());
        permission
    }

    pub fn seed_profile(&self, profile: serde_json::Value) -> Profile {
        let profile: Profile = serde_json::from_value(profile).unwrap();
        let mut b = lock(&self.state);
        b.next_id = b.next_id.max(profile.id.get());
        b.profiles.push(profile.clone());
        profile
    }

    pub fn revoke_all_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    pub fn gate_profile_list(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.state).profile_list_gate = Some(gate.clone());
        gate
    }

    /// Holds the next current-user request until released.
    pub fn gate_me(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.state).me_gate = Some(gate.clone());
        gate
    }

    /// Every current-user request answers `status` until cleared.
    pub fn fail_me_with(&self, status: Option<StatusCode>) {
        lock(&self.state).me_failure = status;
    }

    /// `"METHOD /path"` for every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn issue_token(State(state): State<Shared>, Form(form): Form<LoginForm>) -> Response {
    let mut b = lock(&state);
    b.requests.push("POST /api/auth/token".to_string());

    if b.passwords.get(&form.username) != Some(&form.password) {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    let Some(id) = b.users.iter().find(|u| u.username == form.username).map(|u| u.id) else {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    };

    b.issued += 1;
    let token = format!("token-{}-{}", form.username, b.issued);
    b.tokens.insert(token.clone(), id);
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let gate = {
        let mut b = lock(&state);
        b.requests.push("GET /api/auth/me".to_string());
        b.me_gate.take()
    };
    if let Some(gate) = gate {
        gate.entered.notify_one();
        gate.release.notified().await;
    }

    let b = lock(&state);
    if let Some(status) = b.me_failure {
        return detail(status, "User service unavailable");
    }
    match b.authorize(&headers) {
        Ok(user) => Json(user).into_response(),
        Err(resp) => resp,
    }
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut b = lock(&state);
    b.requests.push("GET /api/users/".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    Json(b.users.clone()).into_response()
}

async fn create_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<UserDraft>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push("POST /api/users/".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    if b.users.iter().any(|u| u.username == draft.username) {
        return detail(StatusCode::BAD_REQUEST, "Username already registered");
    }
    let id = b.next_id();
    let user: User = serde_json::from_value(json!({
        "id": id,
        "username": draft.username,
        "email": draft.email,
        "full_name": draft.full_name,
        "is_active": draft.is_active,
    }))
    .unwrap();
    b.users.push(user.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("PUT /api/users/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let role = patch.role_id.and_then(|rid| {
        b.profiles.iter().find(|p| p.id == rid).map(|p| RoleSummary {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
        })
    });
    let Some(user) = b.users.iter_mut().find(|u| u.id == UserId::new(id)) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if let Some(email) = patch.email {
        user.email = Some(email);
    }
    if let Some(full_name) = patch.full_name {
        user.full_name = Some(full_name);
    }
    if let Some(active) = patch.is_active {
        user.is_active = active;
    }
    if role.is_some() {
        user.role = role;
    }
    Json(user.clone()).into_response()
}

async fn delete_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("DELETE /api/users/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let before = b.users.len();
    b.users.retain(|u| u.id != UserId::new(id));
    if b.users.len() == before {
        return detail(StatusCode::NOT_FOUND, "User not found");
    }
    message("User deleted successfully")
}

async fn list_profiles(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let gate = {
        let mut b = lock(&state);
        b.requests.push("GET /api/profiles".to_string());
        b.profile_list_gate.take()
    };
    if let Some(gate) = gate {
        gate.entered.notify_one();
        gate.release.notified().await;
    }

    let b = lock(&state);
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    Json(b.profiles.clone()).into_response()
}

async fn get_profile(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("GET /api/profiles/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    match b.profiles.iter().find(|p| p.id == ProfileId::new(id)) {
        Some(profile) => Json(profile.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Profile not found"),
    }
}

async fn create_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<ProfileDraft>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push("POST /api/profiles".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    if b.profiles.iter().any(|p| p.name == draft.name) {
        return detail(StatusCode::BAD_REQUEST, "Profile name already exists");
    }
    let id = b.next_id();
    let profile = Profile {
        id: ProfileId::new(id),
        name: draft.name,
        description: draft.description,
        permissions: b.resolve(&draft.permissions),
    };
    b.profiles.push(profile.clone());
    Json(profile).into_response()
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<ProfileDraft>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("PUT /api/profiles/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let permissions = b.resolve(&draft.permissions);
    let Some(profile) = b.profiles.iter_mut().find(|p| p.id == ProfileId::new(id)) else {
        return detail(StatusCode::NOT_FOUND, "Profile not found");
    };
    profile.name = draft.name;
    profile.description = draft.description;
    profile.permissions = permissions;
    Json(profile.clone()).into_response()
}

async fn delete_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("DELETE /api/profiles/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let before = b.profiles.len();
    b.profiles.retain(|p| p.id != ProfileId::new(id));
    if b.profiles.len() == before {
        return detail(StatusCode::NOT_FOUND, "Profile not found");
    }
    message("Profile deleted successfully")
}

async fn link_permission(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, pid)): Path<(i64, i64)>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("POST /api/profiles/{id}/permissions/{pid}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let Some(permission) = b.resolve(&[PermissionId::new(pid)]).pop() else {
        return detail(StatusCode::NOT_FOUND, "Permission not found");
    };
    let Some(profile) = b.profiles.iter_mut().find(|p| p.id == ProfileId::new(id)) else {
        return detail(StatusCode::NOT_FOUND, "Profile not found");
    };
    if profile.has_permission(permission.id) {
        return detail(StatusCode::BAD_REQUEST, "Permission already assigned to profile");
    }
    profile.grant(permission);
    message("Permission added to profile successfully")
}

async fn unlink_permission(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, pid)): Path<(i64, i64)>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("DELETE /api/profiles/{id}/permissions/{pid}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let Some(profile) = b.profiles.iter_mut().find(|p| p.id == ProfileId::new(id)) else {
        return detail(StatusCode::NOT_FOUND, "Profile not found");
    };
    if !profile.has_permission(PermissionId::new(pid)) {
        return detail(StatusCode::BAD_REQUEST, "Permission not assigned to profile");
    }
    profile.revoke(PermissionId::new(pid));
    message("Permission removed from profile successfully")
}

async fn list_permissions(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut b = lock(&state);
    b.requests.push("GET /api/permissions".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    Json(b.permissions.clone()).into_response()
}

async fn create_permission(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<PermissionDraft>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push("POST /api/permissions".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let id = b.next_id();
    let permission = Permission {
        id: PermissionId::new(id),
        name: draft.name,
        description: draft.description,
    };
    b.permissions.push(permission.clone());
    Json(permission).into_response()
}

async fn delete_permission(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("DELETE /api/permissions/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let before = b.permissions.len();
    b.permissions.retain(|p| p.id != PermissionId::new(id));
    if b.permissions.len() == before {
        return detail(StatusCode::NOT_FOUND, "Permission not found");
    }
    message("Permission deleted successfully")
}

async fn list_roles(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut b = lock(&state);
    b.requests.push("GET /api/users/roles/".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let roles: Vec<RoleSummary> = b
        .profiles
        .iter()
        .map(|p| RoleSummary {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
        })
        .collect();
    Json(roles).into_response()
}

async fn list_modules(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut b = lock(&state);
    b.requests.push("GET /api/modules/".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    Json(b.modules.clone()).into_response()
}

fn module_from(id: ModuleId, draft: ModuleDraft) -> Module {
    Module {
        id,
        name: draft.name,
        description: draft.description,
        url: draft.url,
        icon: draft.icon,
        is_active: draft.is_active,
        required_permission_id: Some(draft.required_permission_id),
    }
}

async fn create_module(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<ModuleDraft>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push("POST /api/modules/".to_string());
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    if b.modules.iter().any(|m| m.name == draft.name) {
        return detail(StatusCode::BAD_REQUEST, "Module name already exists");
    }
    let id = b.next_id();
    let module = module_from(ModuleId::new(id), draft);
    b.modules.push(module.clone());
    (StatusCode::CREATED, Json(module)).into_response()
}

async fn update_module(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<ModuleDraft>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("PUT /api/modules/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let Some(module) = b.modules.iter_mut().find(|m| m.id == ModuleId::new(id)) else {
        return detail(StatusCode::NOT_FOUND, "Module not found");
    };
    *module = module_from(module.id, draft);
    Json(module.clone()).into_response()
}

async fn delete_module(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut b = lock(&state);
    b.requests.push(format!("DELETE /api/modules/{id}"));
    if let Err(resp) = b.authorize(&headers) {
        return resp;
    }
    let before = b.modules.len();
    b.modules.retain(|m| m.id != ModuleId::new(id));
    if b.modules.len() == before {
        return detail(StatusCode::NOT_FOUND, "Module not found");
    }
    message("Module deleted successfully")
}
