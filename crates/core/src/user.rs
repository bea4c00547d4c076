//! User accounts as the backend reports them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{require_non_blank, Draft, Entity};
use crate::error::{DomainError, DomainResult};
use crate::id::{ProfileId, UserId};

/// Role reference embedded in a user record, and the entries of the
/// assignable-roles list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: ProfileId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for RoleSummary {
    type Id = ProfileId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A user account.
///
/// Only `id` and `username` are guaranteed; every other field may be absent
/// depending on the endpoint that produced the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub role: Option<RoleSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Name shown in the header and dashboard greeting.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }

    /// Single-letter avatar initial.
    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.name.as_str())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Payload for `POST /api/users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub is_active: bool,
    /// Directory-backed accounts authenticate against LDAP and carry no password.
    pub is_ad_user: bool,
}

impl UserDraft {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
            password: None,
            is_active: true,
            is_ad_user: true,
        }
    }

    /// A local (non-directory) account with its own password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self.is_ad_user = false;
        self
    }
}

impl Draft for UserDraft {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("username", &self.username)?;
        validate_email(&self.email)?;
        if !self.is_ad_user && self.password.as_deref().is_none_or(str::is_empty) {
            return Err(DomainError::validation("local accounts require a password"));
        }
        Ok(())
    }
}

/// Payload for `PUT /api/users/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<ProfileId>,
}

impl Draft for UserPatch {
    fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| DomainError::validation("email must contain '@'"))?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(DomainError::validation(format!("invalid email address '{email}'")));
    }
    Ok(())
}
