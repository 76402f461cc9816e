//! `warden-audit` — append-only audit trail and versioned settings history.
//!
//! Any component performing a tracked action writes here; this crate owns
//! the record shapes and the query contract. Entries are never mutated or
//! deleted. The audit log doubles as the coordination signal for debounced
//! periodic jobs via [`AuditLog::last_occurrence`]; keeping that behind the
//! trait means a future swap to a real lock service only touches the runner.

pub mod history;
pub mod log;

pub use history::{
    HistoryError, InMemorySettingsHistory, SettingsAction, SettingsHistory, SettingsHistoryEntry,
};
pub use log::{Actor, AuditError, AuditLog, AuditLogEntry, InMemoryAuditLog};
