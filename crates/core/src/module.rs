//! Navigable modules listed in the sidebar.

use serde::{Deserialize, Serialize};

use crate::entity::{require_non_blank, Draft, Entity};
use crate::error::{DomainError, DomainResult};
use crate::id::{ModuleId, PermissionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub required_permission_id: Option<PermissionId>,
}

fn default_active() -> bool {
    true
}

impl Entity for Module {
    type Id = ModuleId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Payload for creating or replacing a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub is_active: bool,
    pub required_permission_id: PermissionId,
}

impl ModuleDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>, required: PermissionId) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: url.into(),
            icon: None,
            is_active: true,
            required_permission_id: required,
        }
    }
}

impl Draft for ModuleDraft {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("module name", &self.name)?;
        if !self.url.starts_with('/') {
            return Err(DomainError::validation("module url must start with '/'"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_must_be_app_relative() {
        let draft = ModuleDraft::new("Wiki", "wiki", PermissionId::new(1));
        assert!(draft.validate().is_err());

        let draft = ModuleDraft::new("Wiki", "/wiki", PermissionId::new(1));
        assert!(draft.validate().is_ok());
    }
}
