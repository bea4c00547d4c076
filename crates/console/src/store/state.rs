use omnicorp_auth::{Session, SessionEvent};
use omnicorp_core::{Module, Permission, Profile, RoleSummary, User};

use super::collection::{Collection, CollectionAction};
use super::StoreRejection;

/// Everything the console knows, as one immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub session: Session,
    pub users: Collection<User>,
    /// Roles a user can be assigned, as listed by the user routes.
    pub roles: Collection<RoleSummary>,
    pub profiles: Collection<Profile>,
    pub permissions: Collection<Permission>,
    pub modules: Collection<Module>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Session(SessionEvent),
    Users(CollectionAction<User>),
    Roles(CollectionAction<RoleSummary>),
    Profiles(CollectionAction<Profile>),
    Permissions(CollectionAction<Permission>),
    Modules(CollectionAction<Module>),
}

impl Action {
    pub fn target(&self) -> &'static str {
        match self {
            Action::Session(_) => "session",
            Action::Users(_) => "users",
            Action::Roles(_) => "roles",
            Action::Profiles(_) => "profiles",
            Action::Permissions(_) => "permissions",
            Action::Modules(_) => "modules",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Session(event) => event.name(),
            Action::Users(a) => a.name(),
            Action::Roles(a) => a.name(),
            Action::Profiles(a) => a.name(),
            Action::Permissions(a) => a.name(),
            Action::Modules(a) => a.name(),
        }
    }
}

impl AppState {
    /// Pure reducer.
    pub fn reduce(&self, action: &Action) -> Result<AppState, StoreRejection> {
        let epoch = self.session.epoch();
        let mut next = self.clone();

        match action {
            Action::Session(event) => {
                next.session = self.session.apply(event)?;
                if next.session.epoch() != epoch {
                    next.users.abandon_in_flight();
                    next.roles.abandon_in_flight();
                    next.profiles.abandon_in_flight();
                    next.permissions.abandon_in_flight();
                    next.modules.abandon_in_flight();
                }
            }
            Action::Users(a) => next.users = self.users.apply(a, epoch)?,
            Action::Roles(a) => next.roles = self.roles.apply(a, epoch)?,
            Action::Profiles(a) => next.profiles = self.profiles.apply(a, epoch)?,
            Action::Permissions(a) => next.permissions = self.permissions.apply(a, epoch)?,
            Action::Modules(a) => next.modules = self.modules.apply(a, epoch)?,
        }

        Ok(next)
    }
}
