//! # Actor
//!
//! The identity of the caller as supplied by the session provider. The
//! engine never authenticates; it trusts the role string it is given and
//! normalizes it once here.

use serde::{Deserialize, Serialize};
use tierpay_core::{ResolvedRole, Role, RoleHierarchy, UserId};

/// An authenticated member acting through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: ResolvedRole,
}

impl Actor {
    /// Normalize `raw_role` through the hierarchy's alias table.
    pub fn new(id: UserId, raw_role: &str, hierarchy: &RoleHierarchy) -> Self {
        Self {
            id,
            role: hierarchy.resolve(raw_role),
        }
    }

    /// An actor holding a canonical role.
    pub fn with_role(id: UserId, role: Role) -> Self {
        Self {
            id,
            role: ResolvedRole::Known(role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_role_is_normalized_on_construction() {
        let h = RoleHierarchy::builtin();
        let actor = Actor::new(UserId::new(), "MDS", &h);
        assert_eq!(actor.role, ResolvedRole::Known(Role::MasterDistributor));
    }

    #[test]
    fn unknown_raw_role_is_kept_for_diagnostics() {
        let h = RoleHierarchy::builtin();
        let actor = Actor::new(UserId::new(), "Auditor", &h);
        assert_eq!(actor.role, ResolvedRole::Unrecognized("Auditor".into()));
    }
}
