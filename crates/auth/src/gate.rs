//! Authorization gates.
//!
//! Two deliberately separate checks guard actions: [`PermissionGate`] for
//! tenant-scoped permission membership and [`RoleGate`] for exact role
//! equality against a fixed enumeration. They are selected per guarded call
//! site and never merged: "has permission X" and "is exactly role Y" are
//! different questions, and conflating them is a classic authorization bug.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use warden_core::PolicyConfig;

use crate::{Permission, Principal, RoleName, RoleStore, RoleStoreError};

/// Authorization failure surfaced to callers.
///
/// A single stable variant on purpose: the requester learns the request was
/// rejected, but not whether the role was unknown, soft-deleted, or merely
/// missing the permission. That detail stays in logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("permission denied")]
    PermissionDenied,
}

/// The permission-granular gate.
///
/// Tenant-pinned: the tenant used for role resolution always comes from the
/// authenticated [`Principal`], never from request input. Any resolution
/// failure (missing role, soft-deleted role, storage error or timeout)
/// denies (fail-closed).
pub struct PermissionGate<S> {
    store: S,
}

impl<S: RoleStore> PermissionGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Allow iff the principal's resolved role grants `required` right now.
    ///
    /// No caching: a role update or soft-delete is observed by the very next
    /// call.
    pub fn authorize(
        &self,
        principal: &Principal,
        required: &Permission,
    ) -> Result<(), AuthzError> {
        let role = match self.store.resolve(principal.tenant_id, &principal.role) {
            Ok(role) => role,
            Err(err) => {
                match err {
                    RoleStoreError::NotFound | RoleStoreError::SoftDeleted => debug!(
                        principal = %principal.id,
                        role = %principal.role,
                        reason = %err,
                        "role resolution failed"
                    ),
                    RoleStoreError::Storage(_) => warn!(
                        principal = %principal.id,
                        error = %err,
                        "role store unavailable, denying"
                    ),
                }
                return Err(AuthzError::PermissionDenied);
            }
        };

        if role.has_permission(required) {
            Ok(())
        } else {
            debug!(
                principal = %principal.id,
                role = %principal.role,
                required = %required,
                "permission not granted"
            );
            Err(AuthzError::PermissionDenied)
        }
    }
}

/// The coarse role-equality gate.
///
/// For contexts with a fixed, enumerated role set where a full permission
/// lookup is unnecessary: the principal's role must be a recognized role
/// *and* exactly equal the required one.
pub struct RoleGate {
    config: Arc<PolicyConfig>,
}

impl RoleGate {
    pub fn new(config: Arc<PolicyConfig>) -> Self {
        Self { config }
    }

    pub fn authorize(&self, principal: &Principal, required: &RoleName) -> Result<(), AuthzError> {
        if !self.config.is_recognized_role(principal.role.as_str()) {
            debug!(
                principal = %principal.id,
                role = %principal.role,
                "role not in recognized enumeration"
            );
            return Err(AuthzError::PermissionDenied);
        }

        if &principal.role != required {
            debug!(
                principal = %principal.id,
                role = %principal.role,
                required = %required,
                "role mismatch"
            );
            return Err(AuthzError::PermissionDenied);
        }

        Ok(())
    }
}
