//! `warden-service` — the composition root for the authorization and
//! change-audit subsystem.
//!
//! [`Warden`] bundles the stores, gates, and policy configuration behind the
//! interface the rest of the application consumes. The surrounding HTTP
//! layer, request validation, and authentication are external collaborators;
//! they hand a validated [`Principal`] in and get decisions and records out.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::error;

use warden_audit::{
    Actor, AuditError, AuditLog, AuditLogEntry, HistoryError, InMemoryAuditLog,
    InMemorySettingsHistory, SettingsAction, SettingsHistory, SettingsHistoryEntry,
};
use warden_auth::{
    AuthzError, InMemoryRoleStore, Permission, PermissionGate, Principal, RoleGate, RoleName,
    RoleStore,
};
use warden_core::{PolicyConfig, PrincipalId, TenantId};
use warden_flags::{FlagError, FlagName, FlagStore, InMemoryFlagStore};
use warden_sync::{DebouncedTask, TaskHandle};

/// Handle to the authorization and change-audit subsystem.
///
/// Cheap to clone pieces out of; stores are shared via `Arc` and all methods
/// take `&self`.
pub struct Warden {
    config: Arc<PolicyConfig>,
    roles: Arc<dyn RoleStore>,
    flags: Arc<dyn FlagStore>,
    audit_log: Arc<dyn AuditLog>,
    history: Arc<dyn SettingsHistory>,
    permission_gate: PermissionGate<Arc<dyn RoleStore>>,
    role_gate: RoleGate,
}

impl Warden {
    pub fn new(
        config: Arc<PolicyConfig>,
        roles: Arc<dyn RoleStore>,
        flags: Arc<dyn FlagStore>,
        audit_log: Arc<dyn AuditLog>,
        history: Arc<dyn SettingsHistory>,
    ) -> Self {
        let permission_gate = PermissionGate::new(roles.clone());
        let role_gate = RoleGate::new(config.clone());

        Self {
            config,
            roles,
            flags,
            audit_log,
            history,
            permission_gate,
            role_gate,
        }
    }

    /// Wire the subsystem against the in-memory stores (tests/dev).
    pub fn in_memory(config: PolicyConfig) -> Self {
        let config = Arc::new(config);
        Self::new(
            config.clone(),
            Arc::new(InMemoryRoleStore::new()),
            Arc::new(InMemoryFlagStore::new(config)),
            Arc::new(InMemoryAuditLog::new()),
            Arc::new(InMemorySettingsHistory::new()),
        )
    }

    /// Permission-granular authorization, pinned to the principal's tenant.
    pub fn authorize(
        &self,
        principal: &Principal,
        required: &Permission,
    ) -> Result<(), AuthzError> {
        self.permission_gate.authorize(principal, required)
    }

    /// Coarse role-equality authorization against the recognized role set.
    pub fn authorize_role(
        &self,
        principal: &Principal,
        required: &RoleName,
    ) -> Result<(), AuthzError> {
        self.role_gate.authorize(principal, required)
    }

    /// Record a principal's action in the audit trail.
    ///
    /// The action has already committed when this is called; a returned
    /// error is a secondary signal (alert, don't roll back).
    pub fn audit(
        &self,
        principal: &Principal,
        action: impl Into<String>,
        module: impl Into<String>,
        details: serde_json::Value,
        ip_address: IpAddr,
    ) -> Result<(), AuditError> {
        let entry = AuditLogEntry::new(
            Some(principal.tenant_id),
            Actor::Principal(principal.id),
            action,
            module,
            details,
            ip_address,
        );

        let result = self.audit_log.record(entry);
        if let Err(e) = &result {
            error!(principal = %principal.id, error = %e, "audit write failed");
        }
        result
    }

    /// Append a configuration change to the versioned settings history.
    pub fn record_settings_change(
        &self,
        tenant_id: TenantId,
        module: impl Into<String>,
        action: SettingsAction,
        previous_value: Option<serde_json::Value>,
        new_value: serde_json::Value,
        changed_by: PrincipalId,
        ip_address: IpAddr,
    ) -> Result<(), HistoryError> {
        let entry = SettingsHistoryEntry::new(
            tenant_id,
            module,
            action,
            previous_value,
            new_value,
            changed_by,
            ip_address,
        )?;

        let result = self.history.record_change(entry);
        if let Err(e) = &result {
            error!(tenant = %tenant_id, error = %e, "settings history write failed");
        }
        result
    }

    /// Whether a feature flag is enabled for a tenant (off by default).
    pub fn is_feature_enabled(&self, tenant_id: TenantId, name: &FlagName) -> bool {
        self.flags.is_enabled(tenant_id, name)
    }

    /// Upsert a feature flag on a tenant's document.
    pub fn set_feature_flag(
        &self,
        tenant_id: TenantId,
        name: FlagName,
        enabled: bool,
    ) -> Result<(), FlagError> {
        self.flags.set(tenant_id, name, enabled)
    }

    /// Start a debounced periodic task against the shared audit log.
    ///
    /// The returned handle stops the ticker on `shutdown()`.
    pub fn register_periodic_task(&self, task: DebouncedTask) -> TaskHandle {
        warden_sync::spawn(task, self.audit_log.clone())
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Store handles for administrative wiring (role management, trail
    /// review).
    pub fn roles(&self) -> &Arc<dyn RoleStore> {
        &self.roles
    }

    pub fn audit_log(&self) -> &Arc<dyn AuditLog> {
        &self.audit_log
    }

    pub fn history(&self) -> &Arc<dyn SettingsHistory> {
        &self.history
    }
}
