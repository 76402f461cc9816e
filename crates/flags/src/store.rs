//! Feature flag storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::warn;

use warden_core::{PolicyConfig, TenantId};

use crate::{FlagEntry, FlagName, TenantFlags};

/// Feature flag store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FlagError {
    /// The name is not in the recognized flag enumeration.
    #[error("unrecognized feature flag: {0}")]
    InvalidFlag(String),
    #[error("flag not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

/// Feature flag store abstraction.
pub trait FlagStore: Send + Sync {
    /// Whether `name` is enabled for `tenant_id`.
    ///
    /// Infallible by contract: a missing document, missing entry,
    /// soft-deleted entry, unknown name, or storage failure all read as
    /// `false` (feature off).
    fn is_enabled(&self, tenant_id: TenantId, name: &FlagName) -> bool;

    /// Upsert a flag on the tenant's document, creating the document lazily.
    ///
    /// Updating an existing entry refreshes `updated_at` and clears
    /// `is_deleted`. Unrecognized names are rejected.
    fn set(&self, tenant_id: TenantId, name: FlagName, enabled: bool) -> Result<(), FlagError>;

    /// Mark a flag deleted without removing the entry.
    fn soft_delete(&self, tenant_id: TenantId, name: &FlagName) -> Result<(), FlagError>;
}

impl<S> FlagStore for Arc<S>
where
    S: FlagStore + ?Sized,
{
    fn is_enabled(&self, tenant_id: TenantId, name: &FlagName) -> bool {
        (**self).is_enabled(tenant_id, name)
    }

    fn set(&self, tenant_id: TenantId, name: FlagName, enabled: bool) -> Result<(), FlagError> {
        (**self).set(tenant_id, name, enabled)
    }

    fn soft_delete(&self, tenant_id: TenantId, name: &FlagName) -> Result<(), FlagError> {
        (**self).soft_delete(tenant_id, name)
    }
}

/// In-memory flag store for tests/dev.
#[derive(Debug)]
pub struct InMemoryFlagStore {
    config: Arc<PolicyConfig>,
    docs: RwLock<HashMap<TenantId, TenantFlags>>,
}

impl InMemoryFlagStore {
    pub fn new(config: Arc<PolicyConfig>) -> Self {
        Self {
            config,
            docs: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc(config: Arc<PolicyConfig>) -> Arc<Self> {
        Arc::new(Self::new(config))
    }
}

impl FlagStore for InMemoryFlagStore {
    fn is_enabled(&self, tenant_id: TenantId, name: &FlagName) -> bool {
        let docs = match self.docs.read() {
            Ok(docs) => docs,
            Err(_) => {
                warn!(tenant = %tenant_id, flag = %name, "flag store lock poisoned, reading as off");
                return false;
            }
        };

        docs.get(&tenant_id)
            .and_then(|doc| doc.entry(name))
            .map_or(false, |entry| !entry.is_deleted && entry.enabled)
    }

    fn set(&self, tenant_id: TenantId, name: FlagName, enabled: bool) -> Result<(), FlagError> {
        if !self.config.is_recognized_flag(name.as_str()) {
            return Err(FlagError::InvalidFlag(name.as_str().to_string()));
        }

        let mut docs = self
            .docs
            .write()
            .map_err(|_| FlagError::Storage("flag store lock poisoned".to_string()))?;

        let doc = docs
            .entry(tenant_id)
            .or_insert_with(|| TenantFlags::new(tenant_id));

        match doc.entry_mut(&name) {
            Some(entry) => {
                entry.enabled = enabled;
                entry.updated_at = Utc::now();
                entry.is_deleted = false;
            }
            None => doc.flags.push(FlagEntry::new(name, enabled)),
        }

        Ok(())
    }

    fn soft_delete(&self, tenant_id: TenantId, name: &FlagName) -> Result<(), FlagError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| FlagError::Storage("flag store lock poisoned".to_string()))?;

        let entry = docs
            .get_mut(&tenant_id)
            .and_then(|doc| doc.entry_mut(name))
            .filter(|entry| !entry.is_deleted)
            .ok_or(FlagError::NotFound)?;

        entry.is_deleted = true;
        entry.updated_at = Utc::now();
        Ok(())
    }
}
