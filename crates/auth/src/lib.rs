//! `warden-auth` — tenant role storage and authorization gates.
//!
//! This crate is intentionally decoupled from HTTP and from the
//! authentication layer: a validated [`Principal`] is assumed to be
//! attached to the request before any gate runs.

pub mod gate;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod store;

pub use gate::{AuthzError, PermissionGate, RoleGate};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{Role, RoleName};
pub use store::{InMemoryRoleStore, RoleStore, RoleStoreError};
