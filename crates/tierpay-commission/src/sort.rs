//! # Display Ordering
//!
//! Deterministic ordering of slabs for tables. Ties on the sort key keep
//! the snapshot's original order in both directions, so re-sorting never
//! shuffles equal rows.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierpay_core::RateField;

use crate::model::CommissionSlab;

/// A sortable slab column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlabSortField {
    SlabMin,
    SlabMax,
    IsActive,
    Rate(RateField),
}

impl SlabSortField {
    fn key(&self, slab: &CommissionSlab) -> SortKey {
        match self {
            Self::SlabMin => SortKey::Amount(slab.slab_min),
            Self::SlabMax => SortKey::Amount(slab.slab_max),
            Self::IsActive => SortKey::Flag(slab.is_active),
            Self::Rate(field) => SortKey::Amount(slab.rates.get(*field)),
        }
    }
}

impl std::fmt::Display for SlabSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlabMin => f.write_str("slab_min"),
            Self::SlabMax => f.write_str("slab_max"),
            Self::IsActive => f.write_str("is_active"),
            Self::Rate(field) => write!(f, "{field}"),
        }
    }
}

impl FromStr for SlabSortField {
    type Err = tierpay_core::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slab_min" | "min" => Ok(Self::SlabMin),
            "slab_max" | "max" => Ok(Self::SlabMax),
            "is_active" | "active" => Ok(Self::IsActive),
            other => other.parse::<RateField>().map(Self::Rate),
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Amount(Decimal),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The current table ordering. Starts at `slab_min` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabSort {
    pub field: SlabSortField,
    pub direction: SortDirection,
}

impl Default for SlabSort {
    fn default() -> Self {
        Self {
            field: SlabSortField::SlabMin,
            direction: SortDirection::Ascending,
        }
    }
}

impl SlabSort {
    /// Column-header click: the same column flips direction, a new column
    /// starts ascending.
    pub fn select(self, field: SlabSortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.reversed(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Ascending,
            }
        }
    }

    pub fn apply(&self, slabs: &[CommissionSlab]) -> Vec<CommissionSlab> {
        sort_slabs(slabs, self.field, self.direction)
    }
}

/// Return `slabs` ordered by `field`, ties broken by input position.
pub fn sort_slabs(slabs: &[CommissionSlab], field: SlabSortField, direction: SortDirection) -> Vec<CommissionSlab> {
    let mut indexed: Vec<(usize, &CommissionSlab)> = slabs.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        let primary = field.key(a).cmp(&field.key(b));
        let primary = match direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        match primary {
            Ordering::Equal => ia.cmp(ib),
            other => other,
        }
    });
    indexed.into_iter().map(|(_, s)| s.clone()).collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::model::SlabDraft;
    use proptest::prelude::*;
    use tierpay_core::{CommissionId, RateMap};

    proptest! {
        /// Sorting is a permutation and respects the key order.
        #[test]
        fn sort_is_an_ordered_permutation(mins in proptest::collection::vec(0i64..20, 0..25), desc in any::<bool>()) {
            let commission = CommissionId::new();
            let slabs: Vec<_> = mins
                .iter()
                .map(|m| CommissionSlab::from_draft(commission, &SlabDraft::new(Decimal::from(*m), Decimal::from(m + 1), RateMap::zero())))
                .collect();
            let direction = if desc { SortDirection::Descending } else { SortDirection::Ascending };
            let sorted = sort_slabs(&slabs, SlabSortField::SlabMin, direction);
            prop_assert_eq!(sorted.len(), slabs.len());
            for pair in sorted.windows(2) {
                match direction {
                    SortDirection::Ascending => prop_assert!(pair[0].slab_min <= pair[1].slab_min),
                    SortDirection::Descending => prop_assert!(pair[0].slab_min >= pair[1].slab_min),
                }
            }
            for slab in &slabs {
                prop_assert!(sorted.iter().any(|s| s.id == slab.id));
            }
        }
    }
}
