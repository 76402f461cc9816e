//! Policy configuration loaded once at process start.
//!
//! The recognized permission/role/flag enumerations are supplied by the
//! configuration collaborator and threaded into stores and gates by
//! constructor injection, never read from ambient global state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Immutable enumerations of recognized permissions, roles, and feature flags.
///
/// Construct once from configuration and share via `Arc`. Stores and gates
/// that validate names against a closed set take this by injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    recognized_permissions: HashSet<String>,
    recognized_roles: HashSet<String>,
    recognized_flags: HashSet<String>,
}

impl PolicyConfig {
    pub fn new<P, R, F>(permissions: P, roles: R, flags: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            recognized_permissions: permissions.into_iter().map(Into::into).collect(),
            recognized_roles: roles.into_iter().map(Into::into).collect(),
            recognized_flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    /// Empty configuration (recognizes nothing). Mostly useful in tests.
    pub fn empty() -> Self {
        Self::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            Vec::<String>::new(),
        )
    }

    pub fn is_recognized_permission(&self, name: &str) -> bool {
        self.recognized_permissions.contains(name)
    }

    pub fn is_recognized_role(&self, name: &str) -> bool {
        self.recognized_roles.contains(name)
    }

    pub fn is_recognized_flag(&self, name: &str) -> bool {
        self.recognized_flags.contains(name)
    }

    pub fn recognized_permissions(&self) -> impl Iterator<Item = &str> {
        self.recognized_permissions.iter().map(String::as_str)
    }

    pub fn recognized_roles(&self) -> impl Iterator<Item = &str> {
        self.recognized_roles.iter().map(String::as_str)
    }

    pub fn recognized_flags(&self) -> impl Iterator<Item = &str> {
        self.recognized_flags.iter().map(String::as_str)
    }
}
