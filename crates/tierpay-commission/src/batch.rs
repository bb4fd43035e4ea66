//! # Batch Import Planning
//!
//! Checks a spreadsheet-style list of commission rows before it is sent to
//! the store. Rows without an id become creates, rows with one become
//! updates. Each row is checked for the matching commission permission and
//! for the rate hierarchy; rejected rows are reported by position and the
//! rest are returned ready to submit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierpay_access::{Actor, PermissionResolver};
use tierpay_core::{Action, CommissionId, Domain, EngineError, FieldError, OperatorId, RateMap, SchemeId};

use crate::model::{Commission, CommissionType};
use crate::validator::CommissionHierarchyValidator;

/// One imported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionEntry {
    /// Present when the row edits an existing commission.
    #[serde(default)]
    pub id: Option<CommissionId>,
    pub operator_id: OperatorId,
    #[serde(default)]
    pub service_type: String,
    pub commission_type: CommissionType,
    #[serde(flatten)]
    pub rates: RateMap,
}

impl CommissionEntry {
    pub fn is_existing(&self) -> bool {
        self.id.is_some()
    }

    fn into_commission(self, scheme_id: SchemeId) -> Commission {
        let mut commission = Commission::new(
            scheme_id,
            self.operator_id,
            self.service_type,
            self.commission_type,
            self.rates,
        );
        if let Some(id) = self.id {
            commission.id = id;
        }
        commission
    }
}

/// Why a row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    /// Zero-based position in the submitted list.
    pub row: usize,
    pub message: String,
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<EntryError>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.created + self.updated
    }
}

/// The accepted rows, split by operation, plus the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub scheme_id: SchemeId,
    pub creates: Vec<Commission>,
    pub updates: Vec<Commission>,
    pub report: BatchReport,
}

fn reject(report: &mut BatchReport, row: usize, error: &EngineError) {
    report.failed += 1;
    report.errors.push(EntryError {
        row,
        message: error.to_string(),
        fields: error.field_errors(),
    });
}

/// Partition and check `entries` for import into `scheme_id`.
pub fn plan_batch(
    permissions: &PermissionResolver,
    actor: &Actor,
    scheme_id: SchemeId,
    entries: Vec<CommissionEntry>,
) -> BatchPlan {
    let mut plan = BatchPlan {
        scheme_id,
        creates: Vec::new(),
        updates: Vec::new(),
        report: BatchReport {
            total: entries.len(),
            ..Default::default()
        },
    };

    let may_create = permissions.has_commission_permission(&actor.role, Action::Create);
    let may_update = permissions.has_commission_permission(&actor.role, Action::Update);

    for (row, entry) in entries.into_iter().enumerate() {
        let (allowed, action) = if entry.is_existing() {
            (may_update, Action::Update)
        } else {
            (may_create, Action::Create)
        };
        if !allowed {
            let err = EngineError::PermissionDenied {
                action,
                domain: Domain::Commission,
            };
            reject(&mut plan.report, row, &err);
            continue;
        }
        if let Some(err) = negative_rate(&entry.rates) {
            reject(&mut plan.report, row, &err);
            continue;
        }
        if let Err(err) = CommissionHierarchyValidator::check(&entry.rates) {
            reject(&mut plan.report, row, &err);
            continue;
        }
        if entry.is_existing() {
            plan.report.updated += 1;
            plan.updates.push(entry.into_commission(scheme_id));
        } else {
            plan.report.created += 1;
            plan.creates.push(entry.into_commission(scheme_id));
        }
    }

    tracing::debug!(
        scheme_id = %scheme_id,
        actor = %actor.id,
        total = plan.report.total,
        created = plan.report.created,
        updated = plan.report.updated,
        failed = plan.report.failed,
        "batch planned"
    );
    plan
}

fn negative_rate(rates: &RateMap) -> Option<EngineError> {
    rates
        .iter()
        .find(|(_, rate)| *rate < Decimal::ZERO)
        .map(|(field, _)| EngineError::Range {
            field: field.as_str(),
            message: format!("{field} commission cannot be negative"),
        })
}
