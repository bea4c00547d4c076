//! Permission records.

use serde::{Deserialize, Serialize};

use crate::entity::{require_non_blank, Draft, Entity};
use crate::error::DomainResult;
use crate::id::PermissionId;

/// A named capability that profiles reference.
///
/// Permissions are shared: many profiles may point at the same permission,
/// none of them owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Payload for `POST /permissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PermissionDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl Draft for PermissionDraft {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("permission name", &self.name)
    }
}
