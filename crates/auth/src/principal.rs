use serde::{Deserialize, Serialize};

use warden_core::{PrincipalId, TenantId};

use crate::RoleName;

/// The authenticated identity attached to a request.
///
/// Supplied by the external authentication layer before any gate runs; this
/// subsystem never persists it. The `tenant_id` here is the **only** tenant
/// authorization decisions are allowed to consult; taking a tenant from
/// request input instead would open cross-tenant escalation via parameter
/// injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub tenant_id: TenantId,
    pub role: RoleName,
}

impl Principal {
    pub fn new(id: PrincipalId, tenant_id: TenantId, role: RoleName) -> Self {
        Self {
            id,
            tenant_id,
            role,
        }
    }
}
