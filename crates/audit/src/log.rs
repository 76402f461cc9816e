//! Append-only audit log.

use std::net::IpAddr;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{PrincipalId, TenantId};

/// Who performed a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// Background/system action (periodic jobs, maintenance).
    System,
    Principal(PrincipalId),
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Actor::System => f.write_str("system"),
            Actor::Principal(id) => core::fmt::Display::fmt(id, f),
        }
    }
}

/// One recorded action.
///
/// `tenant_id: None` marks a system-level action. Entries are immutable once
/// written; `created_at` descending is the canonical query order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub tenant_id: Option<TenantId>,
    pub actor: Actor,
    pub action: String,
    pub module: String,
    pub details: serde_json::Value,
    pub ip_address: IpAddr,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        tenant_id: Option<TenantId>,
        actor: Actor,
        action: impl Into<String>,
        module: impl Into<String>,
        details: serde_json::Value,
        ip_address: IpAddr,
    ) -> Self {
        Self {
            tenant_id,
            actor,
            action: action.into(),
            module: module.into(),
            details,
            ip_address,
            created_at: Utc::now(),
        }
    }
}

/// Audit log error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuditError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Audit log abstraction.
///
/// `record` is a pure append. The triggering business action has already
/// committed when it is called, so callers treat a returned error as
/// non-fatal-but-alertable rather than rolling anything back.
pub trait AuditLog: Send + Sync {
    fn record(&self, entry: AuditLogEntry) -> Result<(), AuditError>;

    /// The single most recent entry (by `created_at`) with the given action
    /// tag, across all tenants.
    ///
    /// This is the coordination primitive the debounced periodic runner
    /// builds on.
    fn last_occurrence(&self, action: &str) -> Result<Option<AuditLogEntry>, AuditError>;

    /// Newest-first page of entries for a tenant (`None` = system-level).
    fn recent(
        &self,
        tenant_id: Option<TenantId>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError>;
}

impl<L> AuditLog for Arc<L>
where
    L: AuditLog + ?Sized,
{
    fn record(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        (**self).record(entry)
    }

    fn last_occurrence(&self, action: &str) -> Result<Option<AuditLogEntry>, AuditError> {
        (**self).last_occurrence(action)
    }

    fn recent(
        &self,
        tenant_id: Option<TenantId>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        (**self).recent(tenant_id, limit)
    }
}

/// In-memory audit log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total number of entries (test support).
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for InMemoryAuditLog {
    fn record(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditError::Storage("audit log lock poisoned".to_string()))?;
        entries.push(entry);
        Ok(())
    }

    fn last_occurrence(&self, action: &str) -> Result<Option<AuditLogEntry>, AuditError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditError::Storage("audit log lock poisoned".to_string()))?;

        Ok(entries
            .iter()
            .filter(|e| e.action == action)
            .max_by_key(|e| e.created_at)
            .cloned())
    }

    fn recent(
        &self,
        tenant_id: Option<TenantId>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditError::Storage("audit log lock poisoned".to_string()))?;

        // Append order is chronological for this store.
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.tenant_id == tenant_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn loopback() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    fn entry(tenant_id: Option<TenantId>, action: &str) -> AuditLogEntry {
        AuditLogEntry::new(
            tenant_id,
            Actor::System,
            action,
            "sync",
            serde_json::json!({}),
            loopback(),
        )
    }

    #[test]
    fn last_occurrence_of_absent_action_is_none() {
        let log = InMemoryAuditLog::new();
        assert!(log.last_occurrence("SYNC_NTP").unwrap().is_none());
    }

    #[test]
    fn last_occurrence_returns_most_recent() {
        let log = InMemoryAuditLog::new();

        let mut first = entry(None, "SYNC_NTP");
        first.created_at = Utc::now() - chrono::Duration::minutes(10);
        log.record(first).unwrap();

        let second = entry(None, "SYNC_NTP");
        let expected_at = second.created_at;
        log.record(second).unwrap();
        log.record(entry(None, "SEND_DIGEST")).unwrap();

        let last = log.last_occurrence("SYNC_NTP").unwrap().unwrap();
        assert_eq!(last.created_at, expected_at);
    }

    #[test]
    fn last_occurrence_spans_all_tenants() {
        let log = InMemoryAuditLog::new();
        let tenant = TenantId::new();

        log.record(entry(Some(tenant), "ROLE_UPDATED")).unwrap();

        assert!(log.last_occurrence("ROLE_UPDATED").unwrap().is_some());
    }

    #[test]
    fn recent_is_tenant_filtered_and_newest_first() {
        let log = InMemoryAuditLog::new();
        let acme = TenantId::new();
        let globex = TenantId::new();

        log.record(entry(Some(acme), "FIRST")).unwrap();
        log.record(entry(Some(globex), "OTHER")).unwrap();
        log.record(entry(Some(acme), "SECOND")).unwrap();

        let trail = log.recent(Some(acme), 10).unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, "SECOND");
        assert_eq!(trail[1].action, "FIRST");

        let system = log.recent(None, 10).unwrap();
        assert!(system.is_empty());
    }

    #[test]
    fn recent_honors_limit() {
        let log = InMemoryAuditLog::new();
        let tenant = TenantId::new();

        for i in 0..5 {
            log.record(entry(Some(tenant), &format!("ACTION_{i}"))).unwrap();
        }

        let trail = log.recent(Some(tenant), 2).unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, "ACTION_4");
    }

    #[test]
    fn actor_display() {
        assert_eq!(Actor::System.to_string(), "system");

        let id = PrincipalId::new();
        assert_eq!(Actor::Principal(id).to_string(), id.to_string());
    }
}
