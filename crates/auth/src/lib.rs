//! `omnicorp-auth`: pure session and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP, storage and UI: it only
//! decides which session transitions are legal and what a session may see.

pub mod credential;
pub mod guard;
pub mod policy;
pub mod roles;
pub mod session;

pub use credential::{Credential, CredentialError};
pub use guard::{guard, GuardDecision, LOGIN_PATH};
pub use policy::{AdminGrant, AdminPolicy, AuthzError};
pub use roles::RoleName;
pub use session::{Session, SessionEpoch, SessionEvent, SessionRejection, SessionStatus};
