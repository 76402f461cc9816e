use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::TenantId;

/// Feature flag name.
///
/// The set of valid names is a closed enumeration supplied by
/// [`warden_core::PolicyConfig`]; writes validate against it, reads treat
/// unknown names as disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagName(Cow<'static, str>);

impl FlagName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for FlagName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One toggle inside a tenant's flag document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEntry {
    pub name: FlagName,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl FlagEntry {
    pub fn new(name: FlagName, enabled: bool) -> Self {
        let now = Utc::now();
        Self {
            name,
            enabled,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }
}

/// A tenant's flag document, created lazily on first write.
///
/// Flag names are unique among non-deleted entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFlags {
    pub tenant_id: TenantId,
    pub flags: Vec<FlagEntry>,
}

impl TenantFlags {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            flags: Vec::new(),
        }
    }

    pub fn entry(&self, name: &FlagName) -> Option<&FlagEntry> {
        self.flags.iter().find(|f| &f.name == name)
    }

    pub fn entry_mut(&mut self, name: &FlagName) -> Option<&mut FlagEntry> {
        self.flags.iter_mut().find(|f| &f.name == name)
    }
}
