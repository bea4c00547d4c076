//! Binds each backend resource to its route, payloads and store slice.

use serde::Serialize;
use serde::de::DeserializeOwned;

use omnicorp_core::{
    Draft, Entity, Module, ModuleDraft, Permission, PermissionDraft, Profile, ProfileDraft, User,
    UserDraft, UserPatch,
};

use crate::config::ApiRoutes;
use crate::store::{Action, AppState, Collection, CollectionAction};

/// A REST collection mirrored in the store.
pub trait Resource: 'static {
    type Entity: Entity + Clone + DeserializeOwned + Send + Sync + 'static;
    type Draft: Draft + Serialize;

    /// Singular noun used in logs and prompts.
    const NAME: &'static str;

    fn collection_path(routes: &ApiRoutes) -> &str;

    fn wrap(action: CollectionAction<Self::Entity>) -> Action;

    fn collection(state: &AppState) -> &Collection<Self::Entity>;
}

/// Resources the backend lets us edit in place.
pub trait Updatable: Resource {
    type Patch: Draft + Serialize;
}

#[derive(Debug, Clone, Copy)]
pub struct Users;

#[derive(Debug, Clone, Copy)]
pub struct Profiles;

#[derive(Debug, Clone, Copy)]
pub struct Permissions;

#[derive(Debug, Clone, Copy)]
pub struct Modules;

impl Resource for Users {
    type Entity = User;
    type Draft = UserDraft;
    const NAME: &'static str = "user";

    fn collection_path(routes: &ApiRoutes) -> &str {
        &routes.users
    }

    fn wrap(action: CollectionAction<User>) -> Action {
        Action::Users(action)
    }

    fn collection(state: &AppState) -> &Collection<User> {
        &state.users
    }
}

impl Updatable for Users {
    type Patch = UserPatch;
}

impl Resource for Profiles {
    type Entity = Profile;
    type Draft = ProfileDraft;
    const NAME: &'static str = "profile";

    fn collection_path(routes: &ApiRoutes) -> &str {
        &routes.profiles
    }

    fn wrap(action: CollectionAction<Profile>) -> Action {
        Action::Profiles(action)
    }

    fn collection(state: &AppState) -> &Collection<Profile> {
        &state.profiles
    }
}

impl Updatable for Profiles {
    type Patch = ProfileDraft;
}

// Permissions are created and deleted, never edited.
impl Resource for Permissions {
    type Entity = Permission;
    type Draft = PermissionDraft;
    const NAME: &'static str = "permission";

    fn collection_path(routes: &ApiRoutes) -> &str {
        &routes.permissions
    }

    fn wrap(action: CollectionAction<Permission>) -> Action {
        Action::Permissions(action)
    }

    fn collection(state: &AppState) -> &Collection<Permission> {
        &state.permissions
    }
}

impl Resource for Modules {
    type Entity = Module;
    type Draft = ModuleDraft;
    const NAME: &'static str = "module";

    fn collection_path(routes: &ApiRoutes) -> &str {
        &routes.modules
    }

    fn wrap(action: CollectionAction<Module>) -> Action {
        Action::Modules(action)
    }

    fn collection(state: &AppState) -> &Collection<Module> {
        &state.modules
    }
}

impl Updatable for Modules {
    type Patch = ModuleDraft;
}
