//! `warden-flags` — per-tenant feature toggles with soft-delete.
//!
//! Absence is a safe default: a flag that was never written, belongs to
//! another tenant, or was soft-deleted reads as disabled.

pub mod flag;
pub mod store;

pub use flag::{FlagEntry, FlagName, TenantFlags};
pub use store::{FlagError, FlagStore, InMemoryFlagStore};
