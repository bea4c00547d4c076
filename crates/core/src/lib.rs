//! `omnicorp-core`: domain records shared by every OmniCorp console crate.
//!
//! This crate contains **pure domain** types (no HTTP, no storage, no UI).

pub mod entity;
pub mod error;
pub mod id;
pub mod module;
pub mod permission;
pub mod profile;
pub mod user;

pub use entity::{Draft, Entity};
pub use error::{DomainError, DomainResult};
pub use id::{ModuleId, PermissionId, ProfileId, UserId};
pub use module::{Module, ModuleDraft};
pub use permission::{Permission, PermissionDraft};
pub use profile::{Profile, ProfileDraft};
pub use user::{RoleSummary, User, UserDraft, UserPatch};
