//! # Permission Resolver
//!
//! Table-driven CRUD permissions for the scheme and commission domains,
//! and the whitelist of commission rate columns each role may write.
//!
//! ## Rules
//!
//! - A recognized role is permitted an action when its level is at or above
//!   (numerically less than or equal to) the domain's threshold for it.
//! - An unrecognized role is denied every action, read included.
//! - The editable-field whitelist comes straight from the role table; an
//!   empty list means every rate cell renders read-only.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierpay_core::{
    Action, Domain, EngineError, RateField, RatePatch, ResolvedRole, Role, RoleHierarchy,
    RoleInfo,
};

/// Input constraints for one rate column, as rendered by a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub editable: bool,
    pub required: bool,
    pub min: Decimal,
    pub max: Decimal,
}

/// CRUD booleans for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionFlags {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

/// Every permission answer for one role, computed once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub role: RoleInfo,
    pub schemes: ActionFlags,
    pub commissions: ActionFlags,
    pub editable_commission_fields: Vec<RateField>,
    pub manageable_roles: Vec<Role>,
}

/// Derives permission answers from a role and the injected role table.
#[derive(Debug, Clone, Default)]
pub struct PermissionResolver {
    hierarchy: RoleHierarchy,
}

impl PermissionResolver {
    pub fn new(hierarchy: RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Whether `role` may perform `action` in `domain`.
    pub fn has_permission(&self, role: &ResolvedRole, domain: Domain, action: Action) -> bool {
        let Some(known) = role.known() else {
            return false;
        };
        let threshold = self.hierarchy.table().thresholds(domain).threshold(action);
        self.hierarchy.table().level(known) <= threshold
    }

    pub fn has_scheme_permission(&self, role: &ResolvedRole, action: Action) -> bool {
        self.has_permission(role, Domain::Scheme, action)
    }

    pub fn has_commission_permission(&self, role: &ResolvedRole, action: Action) -> bool {
        self.has_permission(role, Domain::Commission, action)
    }

    /// Fail with [`EngineError::PermissionDenied`] unless permitted.
    pub fn require(&self, role: &ResolvedRole, domain: Domain, action: Action) -> Result<(), EngineError> {
        if self.has_permission(role, domain, action) {
            Ok(())
        } else {
            tracing::debug!(%role, %domain, %action, "permission denied");
            Err(EngineError::PermissionDenied { action, domain })
        }
    }

    /// The ordered rate columns `role` may write.
    pub fn editable_commission_fields(&self, role: &ResolvedRole) -> Vec<RateField> {
        match role.known() {
            Some(known) => self.hierarchy.table().editable_fields(known).to_vec(),
            None => Vec::new(),
        }
    }

    pub fn can_edit_commission_field(&self, role: &ResolvedRole, field: RateField) -> bool {
        match role.known() {
            Some(known) => self.hierarchy.table().editable_fields(known).contains(&field),
            None => false,
        }
    }

    /// Reject a patch that writes any column outside the whitelist. The
    /// first offending column in chain order is reported.
    pub fn ensure_fields_editable(&self, role: &ResolvedRole, patch: &RatePatch) -> Result<(), EngineError> {
        match patch.fields().find(|f| !self.can_edit_commission_field(role, *f)) {
            Some(field) => Err(EngineError::FieldNotEditable {
                role: role.to_string(),
                field,
            }),
            None => Ok(()),
        }
    }

    /// Form rules for every rate column. Rates are percentages in `[0, 100]`.
    pub fn commission_field_rules(&self, role: &ResolvedRole) -> BTreeMap<RateField, FieldRule> {
        RateField::all()
            .iter()
            .map(|field| {
                (
                    *field,
                    FieldRule {
                        editable: self.can_edit_commission_field(role, *field),
                        required: false,
                        min: Decimal::ZERO,
                        max: Decimal::ONE_HUNDRED,
                    },
                )
            })
            .collect()
    }

    pub fn permission_set(&self, role: &ResolvedRole) -> PermissionSet {
        let flags = |domain| ActionFlags {
            create: self.has_permission(role, domain, Action::Create),
            read: self.has_permission(role, domain, Action::Read),
            update: self.has_permission(role, domain, Action::Update),
            delete: self.has_permission(role, domain, Action::Delete),
        };
        PermissionSet {
            role: self.hierarchy.role_info(role),
            schemes: flags(Domain::Scheme),
            commissions: flags(Domain::Commission),
            editable_commission_fields: self.editable_commission_fields(role),
            manageable_roles: self.hierarchy.manageable_roles(role),
        }
    }
}
