//! # Commission Records
//!
//! Wire shapes for commissions and commission slabs as the persistence
//! collaborator returns them. Rate columns are flattened onto the record,
//! so a slab reads `{ "slab_min": 0, "slab_max": 1000, "retailer": 1.5, .. }`.
//!
//! Numeric columns are read leniently: JSON numbers, numeric strings,
//! `null` and blank strings are all accepted, the last two as zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierpay_core::rates::lenient_decimal;
use tierpay_core::{CommissionId, OperatorId, RateMap, RatePatch, SchemeId, SlabId};

fn default_active() -> bool {
    true
}

/// How a commission turns a transaction amount into a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    /// Rates are percentages of the amount.
    Percentage,
    /// Rates are flat payouts per transaction.
    Fixed,
    /// Rates come from the slab covering the amount and apply as percentages.
    #[serde(alias = "slab")]
    SlabBased,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
            Self::SlabBased => "slab_based",
        }
    }
}

impl std::fmt::Display for CommissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commission policy for one operator and service inside a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub scheme_id: SchemeId,
    pub operator_id: OperatorId,
    #[serde(default)]
    pub service_type: String,
    pub commission_type: CommissionType,
    #[serde(flatten)]
    pub rates: RateMap,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Commission {
    pub fn new(
        scheme_id: SchemeId,
        operator_id: OperatorId,
        service_type: impl Into<String>,
        commission_type: CommissionType,
        rates: RateMap,
    ) -> Self {
        Self {
            id: CommissionId::new(),
            scheme_id,
            operator_id,
            service_type: service_type.into(),
            commission_type,
            rates,
            is_active: true,
            updated_at: None,
        }
    }
}

/// One amount band of a slab-based commission. `slab_min` is inclusive,
/// `slab_max` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSlab {
    pub id: SlabId,
    pub commission_id: CommissionId,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub slab_min: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub slab_max: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub rates: RateMap,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CommissionSlab {
    /// Materialize a draft under a fresh id.
    pub fn from_draft(commission_id: CommissionId, draft: &SlabDraft) -> Self {
        Self {
            id: SlabId::new(),
            commission_id,
            slab_min: draft.slab_min,
            slab_max: draft.slab_max,
            is_active: draft.is_active,
            rates: draft.rates,
            updated_at: None,
        }
    }

    /// Whether `amount` falls in `[slab_min, slab_max)`.
    pub fn covers(&self, amount: Decimal) -> bool {
        self.slab_min <= amount && amount < self.slab_max
    }

    /// Half-open interval intersection with `[min, max)`.
    pub fn overlaps(&self, min: Decimal, max: Decimal) -> bool {
        min < self.slab_max && max > self.slab_min
    }

    /// The editable portion of this slab.
    pub fn to_draft(&self) -> SlabDraft {
        SlabDraft {
            slab_min: self.slab_min,
            slab_max: self.slab_max,
            is_active: self.is_active,
            rates: self.rates,
        }
    }
}

/// The fields of a slab that are not assigned by the store. Also the shape
/// of a provisional "new" slab while it is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabDraft {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub slab_min: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub slab_max: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub rates: RateMap,
}

impl SlabDraft {
    pub fn new(slab_min: Decimal, slab_max: Decimal, rates: RateMap) -> Self {
        Self {
            slab_min,
            slab_max,
            is_active: true,
            rates,
        }
    }
}

impl Default for SlabDraft {
    /// The blank row offered when a user adds a slab: `[0, 1000)`, active,
    /// every rate zero.
    fn default() -> Self {
        Self::new(Decimal::ZERO, Decimal::from(1000), RateMap::zero())
    }
}

/// A partial edit of an existing slab. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlabPatch {
    pub slab_min: Option<Decimal>,
    pub slab_max: Option<Decimal>,
    pub is_active: Option<bool>,
    pub rates: RatePatch,
}

impl SlabPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, slab_min: Decimal, slab_max: Decimal) -> Self {
        self.slab_min = Some(slab_min);
        self.slab_max = Some(slab_max);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn rates(mut self, rates: RatePatch) -> Self {
        self.rates = rates;
        self
    }

    /// Replace every field with the values of `draft`.
    pub fn from_draft(draft: &SlabDraft) -> Self {
        let rates = draft
            .rates
            .iter()
            .fold(RatePatch::new(), |patch, (field, rate)| patch.set(field, rate));
        Self {
            slab_min: Some(draft.slab_min),
            slab_max: Some(draft.slab_max),
            is_active: Some(draft.is_active),
            rates,
        }
    }

    /// `base` with this patch applied. Identity and timestamps are kept.
    pub fn apply_to(&self, base: &CommissionSlab) -> CommissionSlab {
        CommissionSlab {
            slab_min: self.slab_min.unwrap_or(base.slab_min),
            slab_max: self.slab_max.unwrap_or(base.slab_max),
            is_active: self.is_active.unwrap_or(base.is_active),
            rates: self.rates.apply_to(&base.rates),
            ..base.clone()
        }
    }
}
