//! # Commission Hierarchy Validator
//!
//! Walks the fixed chain `admin → whitelabel → masterdistributor →
//! distributor → retailer → customer` and reports every adjacent pair
//! where the child column pays more than its parent.
//!
//! The result is a list rather than a boolean: each [`Violation`] names the
//! child column so the caller can highlight it next to the input. The same
//! check applies to flat commissions and to each slab on its own.

use tierpay_core::{EngineError, RateMap, Violation, COMMISSION_CHAIN};

/// Stateless checker for the parent ≥ child rate rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionHierarchyValidator;

impl CommissionHierarchyValidator {
    /// Every inverted adjacent pair, in chain order. Empty when valid.
    pub fn validate(rates: &RateMap) -> Vec<Violation> {
        COMMISSION_CHAIN
            .windows(2)
            .filter(|pair| rates.get(pair[0]) < rates.get(pair[1]))
            .map(|pair| Violation::new(pair[1], pair[0]))
            .collect()
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn check(rates: &RateMap) -> Result<(), EngineError> {
        let violations = Self::validate(rates);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Hierarchy { violations })
        }
    }
}
