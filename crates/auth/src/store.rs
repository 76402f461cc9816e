//! Tenant role storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use warden_core::TenantId;

use crate::{Role, RoleName};

/// Role store error.
///
/// `NotFound` and `SoftDeleted` are distinguished **only** at this layer so
/// administrative tooling can tell them apart; the gates collapse both to
/// denial and never leak which one occurred.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoleStoreError {
    #[error("role not found")]
    NotFound,
    #[error("role is soft-deleted")]
    SoftDeleted,
    #[error("storage error: {0}")]
    Storage(String),
}

/// Role store abstraction.
///
/// Mutation safety is delegated to the storage layer's atomic single-record
/// operations; implementations are not required to provide multi-record
/// transactions.
pub trait RoleStore: Send + Sync {
    /// Resolve a role for `(tenant_id, name)`.
    ///
    /// Resolution is an explicit two-step lookup: a non-deleted tenant-scoped
    /// role wins; otherwise a non-deleted global role of the same name is
    /// used. A soft-deleted tenant-scoped role does not shadow a live global
    /// one.
    fn resolve(&self, tenant_id: TenantId, name: &RoleName) -> Result<Role, RoleStoreError>;

    /// Create or replace the role stored under `(role.tenant_id, role.name)`.
    ///
    /// Upserting over a soft-deleted role reactivates that slot; `(tenant,
    /// name)` stays unique among non-deleted roles.
    fn upsert(&self, role: Role) -> Result<(), RoleStoreError>;

    /// Deactivate a role. The record is kept; every read path filters it out.
    fn soft_delete(
        &self,
        tenant_id: Option<TenantId>,
        name: &RoleName,
    ) -> Result<(), RoleStoreError>;
}

impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    fn resolve(&self, tenant_id: TenantId, name: &RoleName) -> Result<Role, RoleStoreError> {
        (**self).resolve(tenant_id, name)
    }

    fn upsert(&self, role: Role) -> Result<(), RoleStoreError> {
        (**self).upsert(role)
    }

    fn soft_delete(
        &self,
        tenant_id: Option<TenantId>,
        name: &RoleName,
    ) -> Result<(), RoleStoreError> {
        (**self).soft_delete(tenant_id, name)
    }
}

/// In-memory role store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: RwLock<HashMap<(Option<TenantId>, String), Role>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn key(tenant_id: Option<TenantId>, name: &RoleName) -> (Option<TenantId>, String) {
        (tenant_id, name.as_str().to_string())
    }
}

impl RoleStore for InMemoryRoleStore {
    fn resolve(&self, tenant_id: TenantId, name: &RoleName) -> Result<Role, RoleStoreError> {
        let roles = self
            .roles
            .read()
            .map_err(|_| RoleStoreError::Storage("role store lock poisoned".to_string()))?;

        let mut saw_deleted = false;

        // Tenant-scoped lookup first (tenant override semantics).
        if let Some(role) = roles.get(&Self::key(Some(tenant_id), name)) {
            if !role.is_deleted {
                return Ok(role.clone());
            }
            saw_deleted = true;
        }

        // Fall back to a global role of the same name.
        if let Some(role) = roles.get(&Self::key(None, name)) {
            if !role.is_deleted {
                return Ok(role.clone());
            }
            saw_deleted = true;
        }

        if saw_deleted {
            Err(RoleStoreError::SoftDeleted)
        } else {
            Err(RoleStoreError::NotFound)
        }
    }

    fn upsert(&self, role: Role) -> Result<(), RoleStoreError> {
        let mut roles = self
            .roles
            .write()
            .map_err(|_| RoleStoreError::Storage("role store lock poisoned".to_string()))?;

        roles.insert(Self::key(role.tenant_id, &role.name), role);
        Ok(())
    }

    fn soft_delete(
        &self,
        tenant_id: Option<TenantId>,
        name: &RoleName,
    ) -> Result<(), RoleStoreError> {
        let mut roles = self
            .roles
            .write()
            .map_err(|_| RoleStoreError::Storage("role store lock poisoned".to_string()))?;

        match roles.get_mut(&Self::key(tenant_id, name)) {
            Some(role) => {
                role.is_deleted = true;
                Ok(())
            }
            None => Err(RoleStoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Permission;

    fn editor(tenant_id: Option<TenantId>) -> Role {
        Role::new(
            tenant_id,
            RoleName::new("editor"),
            [Permission::new("post.write")],
        )
    }

    #[test]
    fn resolves_tenant_scoped_role() {
        let store = InMemoryRoleStore::new();
        let tenant = TenantId::new();
        store.upsert(editor(Some(tenant))).unwrap();

        let role = store.resolve(tenant, &RoleName::new("editor")).unwrap();
        assert_eq!(role.tenant_id, Some(tenant));
    }

    #[test]
    fn tenant_role_takes_precedence_over_global() {
        let store = InMemoryRoleStore::new();
        let tenant = TenantId::new();

        store
            .upsert(Role::global(
                RoleName::new("editor"),
                [Permission::new("post.read")],
            ))
            .unwrap();
        store
            .upsert(Role::for_tenant(
                tenant,
                RoleName::new("editor"),
                [Permission::new("post.write")],
            ))
            .unwrap();

        let role = store.resolve(tenant, &RoleName::new("editor")).unwrap();
        assert_eq!(role.tenant_id, Some(tenant));
        assert!(role.has_permission(&Permission::new("post.write")));
    }

    #[test]
    fn deleted_tenant_role_does_not_shadow_live_global() {
        let store = InMemoryRoleStore::new();
        let tenant = TenantId::new();

        store.upsert(editor(None)).unwrap();
        store.upsert(editor(Some(tenant))).unwrap();
        store
            .soft_delete(Some(tenant), &RoleName::new("editor"))
            .unwrap();

        let role = store.resolve(tenant, &RoleName::new("editor")).unwrap();
        assert_eq!(role.tenant_id, None);
    }

    #[test]
    fn distinguishes_missing_from_deleted() {
        let store = InMemoryRoleStore::new();
        let tenant = TenantId::new();

        assert!(matches!(
            store.resolve(tenant, &RoleName::new("editor")),
            Err(RoleStoreError::NotFound)
        ));

        store.upsert(editor(Some(tenant))).unwrap();
        store
            .soft_delete(Some(tenant), &RoleName::new("editor"))
            .unwrap();

        assert!(matches!(
            store.resolve(tenant, &RoleName::new("editor")),
            Err(RoleStoreError::SoftDeleted)
        ));
    }

    #[test]
    fn upsert_reactivates_deleted_slot() {
        let store = InMemoryRoleStore::new();
        let tenant = TenantId::new();

        store.upsert(editor(Some(tenant))).unwrap();
        store
            .soft_delete(Some(tenant), &RoleName::new("editor"))
            .unwrap();
        store.upsert(editor(Some(tenant))).unwrap();

        assert!(store.resolve(tenant, &RoleName::new("editor")).is_ok());
    }

    #[test]
    fn tenant_isolation() {
        let store = InMemoryRoleStore::new();
        let tenant1 = TenantId::new();
        let tenant2 = TenantId::new();

        store.upsert(editor(Some(tenant1))).unwrap();

        assert!(matches!(
            store.resolve(tenant2, &RoleName::new("editor")),
            Err(RoleStoreError::NotFound)
        ));
    }

    #[test]
    fn soft_delete_of_missing_role_is_not_found() {
        let store = InMemoryRoleStore::new();

        assert!(matches!(
            store.soft_delete(None, &RoleName::new("ghost")),
            Err(RoleStoreError::NotFound)
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        UpsertTenant(u8),
        UpsertGlobal(u8),
        DeleteTenant(u8),
        DeleteGlobal(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4).prop_map(Op::UpsertTenant),
            (0u8..4).prop_map(Op::UpsertGlobal),
            (0u8..4).prop_map(Op::DeleteTenant),
            (0u8..4).prop_map(Op::DeleteGlobal),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: no sequence of upserts and soft-deletes ever makes
        /// `resolve` return a deleted role. Guards against a read path that
        /// forgets the `is_deleted` filter.
        #[test]
        fn resolve_never_returns_a_deleted_role(
            ops in prop::collection::vec(op_strategy(), 1..32)
        ) {
            let store = InMemoryRoleStore::new();
            let tenant = TenantId::new();
            let names = ["alpha", "beta", "gamma", "delta"];

            for op in &ops {
                match op {
                    Op::UpsertTenant(i) => {
                        let name = RoleName::new(names[*i as usize]);
                        store.upsert(Role::for_tenant(
                            tenant,
                            name,
                            [Permission::new("post.write")],
                        )).unwrap();
                    }
                    Op::UpsertGlobal(i) => {
                        let name = RoleName::new(names[*i as usize]);
                        store.upsert(Role::global(
                            name,
                            [Permission::new("post.read")],
                        )).unwrap();
                    }
                    Op::DeleteTenant(i) => {
                        let _ = store.soft_delete(Some(tenant), &RoleName::new(names[*i as usize]));
                    }
                    Op::DeleteGlobal(i) => {
                        let _ = store.soft_delete(None, &RoleName::new(names[*i as usize]));
                    }
                }

                for name in names {
                    if let Ok(role) = store.resolve(tenant, &RoleName::new(name)) {
                        prop_assert!(!role.is_deleted);
                    }
                }
            }
        }
    }
}
