//! `omnicorp-console`
//!
//! **Responsibility:** the OmniCorp admin client.
//!
//! This crate provides:
//! - The HTTP client adapter (bearer injection, 401 notification)
//! - Credential persistence (file, `localStorage`, memory)
//! - The state container: one reducer, immutable snapshots, subscriptions
//! - One generic CRUD slice for users, profiles, permissions and modules
//! - Session operations and the view models the shell renders
//!
//! The backend remains the authority; the console only mirrors it.

pub mod config;
pub mod console;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod navigation;
pub mod resource;
pub mod session;
pub mod slice;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub mod frontend;

pub use config::{ApiRoutes, ConsoleConfig, RolesEndpoint};
pub use console::Console;
pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::{ApiError, ApiResult};
pub use http::{ApiClient, TransportEvent};
pub use session::{PendingRestore, SessionService};
pub use slice::CrudSlice;
pub use store::{AppState, CollectionStatus, Store};
