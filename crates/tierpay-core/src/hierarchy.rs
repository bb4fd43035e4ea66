//! # Role Hierarchy
//!
//! Ranks roles through the injected [`RoleTable`]. This is the boundary
//! where raw role strings from the identity provider become
//! [`ResolvedRole`] values; everything past this point compares levels.
//!
//! Lookups are pure and side-effect free.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::role::{Level, ResolvedRole, Role};
use crate::table::RoleTable;

/// Summary of a role for display and session scoping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub name: String,
    pub display_name: String,
    pub level: Level,
    pub is_highest: bool,
    pub is_lowest: bool,
}

/// Level comparison over a shared role table.
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    table: Arc<RoleTable>,
}

impl RoleHierarchy {
    pub fn new(table: Arc<RoleTable>) -> Self {
        Self { table }
    }

    /// A hierarchy over [`RoleTable::builtin`].
    pub fn builtin() -> Self {
        Self::new(Arc::new(RoleTable::builtin()))
    }

    pub fn table(&self) -> &Arc<RoleTable> {
        &self.table
    }

    /// Normalize a raw role string: trim, lowercase, resolve aliases.
    pub fn resolve(&self, raw: &str) -> ResolvedRole {
        let key = raw.trim().to_ascii_lowercase();
        match self.table.alias(&key) {
            Some(role) => ResolvedRole::Known(role),
            None => ResolvedRole::Unrecognized(raw.to_string()),
        }
    }

    /// Rank of a resolved role; [`Level::UNRANKED`] when unrecognized.
    pub fn level(&self, role: &ResolvedRole) -> Level {
        match role {
            ResolvedRole::Known(role) => self.table.level(*role),
            ResolvedRole::Unrecognized(_) => Level::UNRANKED,
        }
    }

    /// Resolve and rank a raw role string in one step.
    pub fn level_of(&self, raw: &str) -> Level {
        self.level(&self.resolve(raw))
    }

    /// Whether `a` is strictly senior to `b`.
    pub fn is_ancestor(&self, a: &ResolvedRole, b: &ResolvedRole) -> bool {
        self.level(a) < self.level(b)
    }

    /// Whether `actor` may manage members holding `target`. Same rule as
    /// [`is_ancestor`](Self::is_ancestor): managing requires strict seniority.
    pub fn can_manage(&self, actor: &ResolvedRole, target: &ResolvedRole) -> bool {
        self.is_ancestor(actor, target)
    }

    /// Canonical roles strictly junior to `role`, in chain order.
    pub fn manageable_roles(&self, role: &ResolvedRole) -> Vec<Role> {
        let level = self.level(role);
        Role::all()
            .iter()
            .copied()
            .filter(|r| self.table.level(*r) > level)
            .collect()
    }

    /// Human-readable name. Unrecognized roles echo their raw text.
    pub fn display_name(&self, role: &ResolvedRole) -> String {
        match role {
            ResolvedRole::Known(role) => role.display_name().to_string(),
            ResolvedRole::Unrecognized(raw) => raw.clone(),
        }
    }

    pub fn role_info(&self, role: &ResolvedRole) -> RoleInfo {
        let level = self.level(role);
        let lowest = Role::all()
            .iter()
            .map(|r| self.table.level(*r))
            .max()
            .unwrap_or(Level::TOP);
        RoleInfo {
            name: role.to_string(),
            display_name: self.display_name(role),
            level,
            is_highest: level == Level::TOP,
            is_lowest: level.is_ranked() && level == lowest,
        }
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::builtin()
    }
}
