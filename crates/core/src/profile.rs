//! Profile (role) records and their permission sets.

use serde::{Deserialize, Serialize};

use crate::entity::{require_non_blank, Draft, Entity};
use crate::error::{DomainError, DomainResult};
use crate::id::{PermissionId, ProfileId};
use crate::permission::Permission;

/// A profile groups permissions under a name.
///
/// The backend embeds the referenced permissions; the profile owns only the
/// set of references, not the permission records themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Profile {
    pub fn permission_ids(&self) -> Vec<PermissionId> {
        self.permissions.iter().map(|p| p.id).collect()
    }

    pub fn has_permission(&self, id: PermissionId) -> bool {
        self.permissions.iter().any(|p| p.id == id)
    }

    /// Link a permission, keeping the set free of duplicates.
    pub fn grant(&mut self, permission: Permission) {
        if !self.has_permission(permission.id) {
            self.permissions.push(permission);
        }
    }

    pub fn revoke(&mut self, id: PermissionId) {
        self.permissions.retain(|p| p.id != id);
    }
}

impl Entity for Profile {
    type Id = ProfileId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Payload for creating or replacing a profile.
///
/// Permissions travel as ids; the backend resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionId>,
}

impl ProfileDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = PermissionId>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Pre-fill an edit form from an existing profile.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            description: profile.description.clone(),
            permissions: profile.permission_ids(),
        }
    }
}

impl Draft for ProfileDraft {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("profile name", &self.name)?;

        let mut seen = std::collections::HashSet::new();
        for id in &self.permissions {
            if !seen.insert(*id) {
                return Err(DomainError::validation(format!(
                    "permission {id} listed more than once"
                )));
            }
        }
        Ok(())
    }
}
