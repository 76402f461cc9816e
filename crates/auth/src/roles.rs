use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use warden_core::TenantId;

use crate::Permission;

/// Role name used for RBAC lookups.
///
/// Names are opaque strings at this layer; the mapping from a name to a
/// permission set lives in the [`crate::RoleStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored role: a named bundle of permissions scoped to a tenant.
///
/// `tenant_id: None` means the role is global. Roles are never hard-deleted;
/// deactivation sets `is_deleted` and every read path filters on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub tenant_id: Option<TenantId>,
    pub name: RoleName,
    pub permissions: Vec<Permission>,
    pub is_deleted: bool,
}

impl Role {
    pub fn new(
        tenant_id: Option<TenantId>,
        name: RoleName,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            tenant_id,
            name,
            permissions: permissions.into_iter().collect(),
            is_deleted: false,
        }
    }

    /// Tenant-scoped role.
    pub fn for_tenant(
        tenant_id: TenantId,
        name: RoleName,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self::new(Some(tenant_id), name, permissions)
    }

    /// Global role, available to every tenant unless overridden.
    pub fn global(name: RoleName, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(None, name, permissions)
    }

    /// Exact membership check against this role's grant set.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
