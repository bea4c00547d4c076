//! Administrative access checks for role-gated navigation.

use thiserror::Error;

use omnicorp_core::User;

use crate::roles::RoleName;
use crate::session::Session;

/// Account name granted admin rights regardless of its role.
pub const DEFAULT_FALLBACK_ADMIN: &str = "administrator";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("forbidden: '{0}' is not an administrator")]
    Forbidden(String),
}

/// Why a user was treated as an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGrant {
    /// The user's role name equals the administrative role.
    Role,
    /// The username equals the fallback admin account. This bypasses roles
    /// entirely and exists for bootstrap accounts only.
    FallbackAccount,
}

/// Decides which users see admin-only navigation.
///
/// The fallback account rule is kept for parity with existing deployments but
/// can be turned off with [`AdminPolicy::without_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPolicy {
    admin_role: RoleName,
    fallback_username: Option<String>,
}

impl Default for AdminPolicy {
    fn default() -> Self {
        Self {
            admin_role: RoleName::ADMIN,
            fallback_username: Some(DEFAULT_FALLBACK_ADMIN.to_string()),
        }
    }
}

impl AdminPolicy {
    pub fn new(admin_role: RoleName, fallback_username: Option<String>) -> Self {
        Self {
            admin_role,
            fallback_username: fallback_username.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback_username = None;
        self
    }

    pub fn admin_role(&self) -> &RoleName {
        &self.admin_role
    }

    pub fn fallback_username(&self) -> Option<&str> {
        self.fallback_username.as_deref()
    }

    /// Pure check; the role match wins when both rules apply.
    pub fn admin_grant(&self, user: &User) -> Option<AdminGrant> {
        if user.role_name().is_some_and(|r| self.admin_role.matches(r)) {
            return Some(AdminGrant::Role);
        }
        if self.fallback_username.as_deref() == Some(user.username.as_str()) {
            return Some(AdminGrant::FallbackAccount);
        }
        None
    }

    pub fn is_admin(&self, user: &User) -> bool {
        match self.admin_grant(user) {
            Some(AdminGrant::Role) => true,
            Some(AdminGrant::FallbackAccount) => {
                tracing::warn!(
                    username = %user.username,
                    "admin access granted by fallback account name, not by role"
                );
                true
            }
            None => false,
        }
    }

    /// Admin check against the current session.
    pub fn authorize(&self, session: &Session) -> Result<(), AuthzError> {
        let user = match (session.is_authenticated(), session.current_user()) {
            (true, Some(user)) => user,
            _ => return Err(AuthzError::NotAuthenticated),
        };
        if self.is_admin(user) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(user.username.clone()))
        }
    }
}
