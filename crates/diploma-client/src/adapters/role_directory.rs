//! Static Role Directory Adapter
//!
//! Implements `RoleResolver` over a fixed table loaded from configuration.

use std::collections::HashMap;

use crate::config::RolesConfig;
use crate::domain::{Identity, Role};
use crate::ports::outbound::RoleResolver;

/// Fixed identity to role table. Matching is exact.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleDirectory {
    roles: HashMap<String, Role>,
}

impl StaticRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration entries. Later entries win.
    pub fn from_config(config: &RolesConfig) -> Self {
        config
            .entries
            .iter()
            .fold(Self::new(), |dir, e| dir.with(e.address.clone(), e.role))
    }

    /// Add one entry.
    pub fn with(mut self, address: impl Into<String>, role: Role) -> Self {
        self.roles.insert(address.into(), role);
        self
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleResolver for StaticRoleDirectory {
    fn resolve(&self, identity: &Identity) -> Role {
        self.roles
            .get(identity.as_str())
            .copied()
            .unwrap_or(Role::None)
    }
}
