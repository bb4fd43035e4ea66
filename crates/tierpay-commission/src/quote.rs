//! # Commission Quoting
//!
//! Turns a commission and a transaction amount into the payout one role
//! earns:
//!
//! | Type         | Payout                                  |
//! |--------------|-----------------------------------------|
//! | `percentage` | `amount × rate / 100`                   |
//! | `fixed`      | `rate`                                  |
//! | `slab_based` | `amount × slab rate / 100`, zero if no active slab covers the amount |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierpay_core::{EngineError, Role, SlabId};

use crate::model::{Commission, CommissionType};
use crate::slab::SlabSet;

/// The outcome of [`quote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub role: Role,
    pub amount: Decimal,
    pub commission_type: CommissionType,
    /// The rate that applied: a percentage, or a flat payout for `fixed`.
    pub rate: Decimal,
    /// The slab the rate came from, for slab-based commissions.
    pub slab_id: Option<SlabId>,
    pub payout: Decimal,
}

/// Compute `role`'s payout on `amount`. `slabs` is consulted only for
/// slab-based commissions.
pub fn quote(commission: &Commission, slabs: &SlabSet, amount: Decimal, role: Role) -> Result<Quote, EngineError> {
    if amount < Decimal::ZERO {
        return Err(EngineError::Range {
            field: "amount",
            message: "Amount cannot be negative".to_string(),
        });
    }

    let (rate, slab_id) = match commission.commission_type {
        CommissionType::Percentage | CommissionType::Fixed => (commission.rates.rate_for(role), None),
        CommissionType::SlabBased => match slabs.covering(amount) {
            Some(slab) => (slab.rates.rate_for(role), Some(slab.id)),
            None => (Decimal::ZERO, None),
        },
    };

    let payout = match commission.commission_type {
        CommissionType::Fixed => rate,
        CommissionType::Percentage | CommissionType::SlabBased => amount * rate / Decimal::ONE_HUNDRED,
    };

    tracing::debug!(
        commission_id = %commission.id,
        %role,
        %amount,
        %rate,
        %payout,
        "commission quoted"
    );

    Ok(Quote {
        role,
        amount,
        commission_type: commission.commission_type,
        rate,
        slab_id,
        payout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlabDraft;
    use tierpay_core::{OperatorId, RateField, RateMap, SchemeId};

    fn rates(retailer: Decimal) -> RateMap {
        RateMap::zero()
            .with(RateField::Admin, Decimal::from(5))
            .with(RateField::WhiteLabel, Decimal::from(4))
            .with(RateField::MasterDistributor, Decimal::from(3))
            .with(RateField::Distributor, Decimal::from(3))
            .with(RateField::Retailer, retailer)
    }

    fn commission(kind: CommissionType) -> Commission {
        Commission::new(SchemeId::new(), OperatorId::new(), "aeps", kind, rates(Decimal::new(15, 1)))
    }

    #[test]
    fn percentage_scales_with_amount() {
        let c = commission(CommissionType::Percentage);
        let q = quote(&c, &SlabSet::new(c.id), Decimal::from(2000), Role::Retailer).unwrap();
        assert_eq!(q.payout, Decimal::from(30));
        assert_eq!(q.rate, Decimal::new(15, 1));
        assert_eq!(q.slab_id, None);
    }

    #[test]
    fn fixed_ignores_amount() {
        let c = commission(CommissionType::Fixed);
        let q = quote(&c, &SlabSet::new(c.id), Decimal::from(999_999), Role::Retailer).unwrap();
        assert_eq!(q.payout, Decimal::new(15, 1));
    }

    #[test]
    fn slab_based_uses_covering_slab() {
        let c = commission(CommissionType::SlabBased);
        let mut slabs = SlabSet::new(c.id);
        slabs
            .add(SlabDraft::new(Decimal::ZERO, Decimal::from(100), rates(Decimal::ONE)))
            .unwrap();
        let band = slabs
            .add(SlabDraft::new(Decimal::from(100), Decimal::from(1000), rates(Decimal::TWO)))
            .unwrap()
            .id;

        let q = quote(&c, &slabs, Decimal::from(250), Role::Retailer).unwrap();
        assert_eq!(q.rate, Decimal::TWO);
        assert_eq!(q.slab_id, Some(band));
        assert_eq!(q.payout, Decimal::from(5));

        let uncovered = quote(&c, &slabs, Decimal::from(7000), Role::Retailer).unwrap();
        assert_eq!(uncovered.payout, Decimal::ZERO);
        assert_eq!(uncovered.slab_id, None);
    }

    #[test]
    fn negative_amount_is_a_range_error() {
        let c = commission(CommissionType::Percentage);
        let err = quote(&c, &SlabSet::new(c.id), Decimal::NEGATIVE_ONE, Role::Retailer).unwrap_err();
        assert!(matches!(err, EngineError::Range { field: "amount", .. }));
    }

    #[test]
    fn super_admin_has_no_payout_column() {
        let c = commission(CommissionType::Percentage);
        let q = quote(&c, &SlabSet::new(c.id), Decimal::from(100), Role::SuperAdmin).unwrap();
        assert_eq!(q.payout, Decimal::ZERO);
    }
}
