//! Entity trait: identity + continuity across state changes.

use crate::error::DomainResult;

/// Entity marker + minimal interface.
///
/// Collections in the console store are keyed by `Entity::id`; two records
/// with the same id are the same entity regardless of their other fields.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// A payload sent to the backend to create or change an entity.
///
/// Validation is local and deterministic; the backend remains the authority.
pub trait Draft {
    fn validate(&self) -> DomainResult<()>;
}

/// Shared check for the `name` field most drafts carry.
pub(crate) fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(crate::DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
