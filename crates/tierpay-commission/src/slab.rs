//! # Slab Set
//!
//! The slabs of one slab-based commission, in the order the store returned
//! them. Every mutation is validated before it touches the set:
//!
//! 1. `slab_min >= 0` and `slab_max > slab_min`.
//! 2. The candidate, active or not, must not intersect any other active
//!    slab of the same commission (half-open `[min, max)` intersection).
//!    Inactive slabs never block.
//! 3. The candidate's rates satisfy the commission hierarchy.
//!
//! A rejected mutation leaves the set unchanged. Removal is unconditional:
//! taking an interval away cannot create an overlap.
//!
//! The set is always built from the most recent snapshot the caller
//! fetched. It never reconciles concurrent edits made elsewhere; the store
//! reports those as conflicts.

use rust_decimal::Decimal;
use tierpay_core::{CommissionId, EngineError, RecordKind, Role, SlabId};

use crate::model::{CommissionSlab, SlabDraft, SlabPatch};
use crate::validator::CommissionHierarchyValidator;

/// An ordered, validated collection of slabs for a single commission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabSet {
    commission_id: CommissionId,
    slabs: Vec<CommissionSlab>,
}

impl SlabSet {
    pub fn new(commission_id: CommissionId) -> Self {
        Self {
            commission_id,
            slabs: Vec::new(),
        }
    }

    /// Adopt a fetched snapshot as-is. Records belonging to another
    /// commission are dropped.
    pub fn from_snapshot(commission_id: CommissionId, slabs: Vec<CommissionSlab>) -> Self {
        let total = slabs.len();
        let slabs: Vec<_> = slabs
            .into_iter()
            .filter(|s| s.commission_id == commission_id)
            .collect();
        if slabs.len() != total {
            tracing::warn!(
                commission_id = %commission_id,
                dropped = total - slabs.len(),
                "snapshot contained slabs of another commission"
            );
        }
        Self { commission_id, slabs }
    }

    pub fn commission_id(&self) -> CommissionId {
        self.commission_id
    }

    pub fn slabs(&self) -> &[CommissionSlab] {
        &self.slabs
    }

    pub fn len(&self) -> usize {
        self.slabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }

    pub fn get(&self, slab_id: SlabId) -> Option<&CommissionSlab> {
        self.slabs.iter().find(|s| s.id == slab_id)
    }

    pub fn active(&self) -> impl Iterator<Item = &CommissionSlab> {
        self.slabs.iter().filter(|s| s.is_active)
    }

    /// The first active slab, other than `exclude`, intersecting `[min, max)`.
    pub fn find_overlap(&self, min: Decimal, max: Decimal, exclude: Option<SlabId>) -> Option<&CommissionSlab> {
        self.active()
            .filter(|s| Some(s.id) != exclude)
            .find(|s| s.overlaps(min, max))
    }

    /// Run every check for `candidate` as if it were stored in this set.
    /// `exclude` is the slab being replaced, if any.
    pub fn validate(&self, candidate: &SlabDraft, exclude: Option<SlabId>) -> Result<(), EngineError> {
        check_range(candidate.slab_min, candidate.slab_max)?;
        if let Some(existing) = self.find_overlap(candidate.slab_min, candidate.slab_max, exclude) {
            return Err(EngineError::Overlap {
                conflicting_slab_id: existing.id,
            });
        }
        CommissionHierarchyValidator::check(&candidate.rates)
    }

    /// Validate and append a new slab under a fresh id.
    pub fn add(&mut self, draft: SlabDraft) -> Result<&CommissionSlab, EngineError> {
        if let Err(err) = self.validate(&draft, None) {
            tracing::warn!(commission_id = %self.commission_id, error = %err, "slab add rejected");
            return Err(err);
        }
        let slab = CommissionSlab::from_draft(self.commission_id, &draft);
        tracing::debug!(commission_id = %self.commission_id, slab_id = %slab.id, "slab added");
        let index = self.slabs.len();
        self.slabs.push(slab);
        Ok(&self.slabs[index])
    }

    /// The slab `slab_id` would become under `patch`, validated against the
    /// rest of the set. Does not mutate.
    pub fn preview_update(&self, slab_id: SlabId, patch: &SlabPatch) -> Result<CommissionSlab, EngineError> {
        let current = self.get(slab_id).ok_or_else(|| not_found(slab_id))?;
        let candidate = patch.apply_to(current);
        self.validate(&candidate.to_draft(), Some(slab_id))?;
        Ok(candidate)
    }

    /// Validate and apply `patch` to an existing slab.
    pub fn update(&mut self, slab_id: SlabId, patch: &SlabPatch) -> Result<&CommissionSlab, EngineError> {
        let candidate = match self.preview_update(slab_id, patch) {
            Ok(candidate) => candidate,
            Err(err) => {
                tracing::warn!(
                    commission_id = %self.commission_id,
                    slab_id = %slab_id,
                    error = %err,
                    "slab update rejected"
                );
                return Err(err);
            }
        };
        let index = self.position(slab_id).ok_or_else(|| not_found(slab_id))?;
        self.slabs[index] = candidate;
        tracing::debug!(commission_id = %self.commission_id, slab_id = %slab_id, "slab updated");
        Ok(&self.slabs[index])
    }

    /// Remove a slab. Returns the removed record, or `None` if absent.
    pub fn remove(&mut self, slab_id: SlabId) -> Option<CommissionSlab> {
        let index = self.position(slab_id)?;
        tracing::debug!(commission_id = %self.commission_id, slab_id = %slab_id, "slab removed");
        Some(self.slabs.remove(index))
    }

    /// Store the canonical record returned by the store, replacing any
    /// local copy with the same id. The store's answer is authoritative and
    /// is not re-validated.
    pub fn merge(&mut self, record: CommissionSlab) {
        if record.commission_id != self.commission_id {
            tracing::warn!(
                commission_id = %self.commission_id,
                slab_id = %record.id,
                "ignoring merged slab of another commission"
            );
            return;
        }
        match self.position(record.id) {
            Some(index) => self.slabs[index] = record,
            None => self.slabs.push(record),
        }
    }

    /// The active slab with `slab_min <= amount < slab_max`.
    pub fn covering(&self, amount: Decimal) -> Option<&CommissionSlab> {
        self.active().find(|s| s.covers(amount))
    }

    /// The rate `role` earns on `amount`. Zero when no active slab covers
    /// the amount.
    pub fn resolve(&self, amount: Decimal, role: Role) -> Decimal {
        match self.covering(amount) {
            Some(slab) => slab.rates.rate_for(role),
            None => {
                tracing::debug!(commission_id = %self.commission_id, %amount, "no slab covers amount");
                Decimal::ZERO
            }
        }
    }

    fn position(&self, slab_id: SlabId) -> Option<usize> {
        self.slabs.iter().position(|s| s.id == slab_id)
    }
}

/// Bounds check shared by add and update.
pub fn check_range(slab_min: Decimal, slab_max: Decimal) -> Result<(), EngineError> {
    if slab_min < Decimal::ZERO {
        return Err(EngineError::Range {
            field: "slab_min",
            message: "Minimum amount cannot be negative".to_string(),
        });
    }
    if slab_max <= slab_min {
        return Err(EngineError::Range {
            field: "slab_max",
            message: "Maximum amount must be greater than minimum".to_string(),
        });
    }
    Ok(())
}

fn not_found(slab_id: SlabId) -> EngineError {
    EngineError::NotFound {
        kind: RecordKind::Slab,
        id: slab_id.to_string(),
    }
}
