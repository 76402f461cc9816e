//! Versioned settings history with rollback provenance.

use std::net::IpAddr;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{PrincipalId, TenantId};

/// Kind of configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsAction {
    Create,
    Update,
    Rollback,
}

/// One recorded configuration change.
///
/// Append-only. A rollback entry's `new_value` equals some earlier entry's
/// `previous_value` for the same `(tenant, module)`, and its own
/// `previous_value` is the value being reverted from; sourcing those is the
/// caller's responsibility. This component only persists what it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsHistoryEntry {
    pub tenant_id: TenantId,
    pub module: String,
    pub action: SettingsAction,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: serde_json::Value,
    pub changed_by: PrincipalId,
    pub ip_address: IpAddr,
    pub created_at: DateTime<Utc>,
}

/// Settings history error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryError {
    /// The change violates a shape invariant (e.g. a create with a previous
    /// value).
    #[error("invalid settings change: {0}")]
    InvalidChange(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl SettingsHistoryEntry {
    /// Generic constructor; validates that `Create` carries no previous
    /// value.
    pub fn new(
        tenant_id: TenantId,
        module: impl Into<String>,
        action: SettingsAction,
        previous_value: Option<serde_json::Value>,
        new_value: serde_json::Value,
        changed_by: PrincipalId,
        ip_address: IpAddr,
    ) -> Result<Self, HistoryError> {
        if matches!(action, SettingsAction::Create) && previous_value.is_some() {
            return Err(HistoryError::InvalidChange(
                "create must not carry a previous value".to_string(),
            ));
        }

        Ok(Self {
            tenant_id,
            module: module.into(),
            action,
            previous_value,
            new_value,
            changed_by,
            ip_address,
            created_at: Utc::now(),
        })
    }

    /// First value for a `(tenant, module)` pair.
    pub fn create(
        tenant_id: TenantId,
        module: impl Into<String>,
        new_value: serde_json::Value,
        changed_by: PrincipalId,
        ip_address: IpAddr,
    ) -> Self {
        Self {
            tenant_id,
            module: module.into(),
            action: SettingsAction::Create,
            previous_value: None,
            new_value,
            changed_by,
            ip_address,
            created_at: Utc::now(),
        }
    }

    pub fn update(
        tenant_id: TenantId,
        module: impl Into<String>,
        previous_value: serde_json::Value,
        new_value: serde_json::Value,
        changed_by: PrincipalId,
        ip_address: IpAddr,
    ) -> Self {
        Self {
            tenant_id,
            module: module.into(),
            action: SettingsAction::Update,
            previous_value: Some(previous_value),
            new_value,
            changed_by,
            ip_address,
            created_at: Utc::now(),
        }
    }

    /// Revert to an earlier recorded value. `previous_value` is the value
    /// being reverted *from*, `new_value` the earlier value being restored.
    pub fn rollback(
        tenant_id: TenantId,
        module: impl Into<String>,
        previous_value: serde_json::Value,
        new_value: serde_json::Value,
        changed_by: PrincipalId,
        ip_address: IpAddr,
    ) -> Self {
        Self {
            tenant_id,
            module: module.into(),
            action: SettingsAction::Rollback,
            previous_value: Some(previous_value),
            new_value,
            changed_by,
            ip_address,
            created_at: Utc::now(),
        }
    }
}

/// Settings history abstraction.
pub trait SettingsHistory: Send + Sync {
    /// Append a change. Rollback never deletes prior entries.
    fn record_change(&self, entry: SettingsHistoryEntry) -> Result<(), HistoryError>;

    /// All changes for `(tenant, module)`, newest first.
    fn history(
        &self,
        tenant_id: TenantId,
        module: &str,
    ) -> Result<Vec<SettingsHistoryEntry>, HistoryError>;
}

impl<H> SettingsHistory for Arc<H>
where
    H: SettingsHistory + ?Sized,
{
    fn record_change(&self, entry: SettingsHistoryEntry) -> Result<(), HistoryError> {
        (**self).record_change(entry)
    }

    fn history(
        &self,
        tenant_id: TenantId,
        module: &str,
    ) -> Result<Vec<SettingsHistoryEntry>, HistoryError> {
        (**self).history(tenant_id, module)
    }
}

/// In-memory settings history for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySettingsHistory {
    entries: RwLock<Vec<SettingsHistoryEntry>>,
}

impl InMemorySettingsHistory {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl SettingsHistory for InMemorySettingsHistory {
    fn record_change(&self, entry: SettingsHistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| HistoryError::Storage("settings history lock poisoned".to_string()))?;
        entries.push(entry);
        Ok(())
    }

    fn history(
        &self,
        tenant_id: TenantId,
        module: &str,
    ) -> Result<Vec<SettingsHistoryEntry>, HistoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| HistoryError::Storage("settings history lock poisoned".to_string()))?;

        // Append order is chronological for this store.
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.tenant_id == tenant_id && e.module == module)
            .cloned()
            .collect())
    }
}
