//! # Persistence Collaborator
//!
//! The remote store holding schemes, commissions and slabs is an external
//! system. These traits are the seam the engine calls through; the engine
//! validates locally first and treats whatever the store returns as the
//! canonical record.
//!
//! Optimistic concurrency: every slab listing carries the commission's
//! current revision. Writes name the revision the caller last saw, and the
//! store refuses a write against an older one with
//! [`RepositoryError::Conflict`]. The engine never retries a conflict.
//!
//! [`InMemoryRepository`] implements both traits for tests and the CLI.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tierpay_access::{check_scheme_fields, Scheme};
use tierpay_core::{CommissionId, EngineError, RecordKind, SchemeId, SlabId, UserId};

use crate::model::{CommissionSlab, SlabDraft, SlabPatch};

/// Errors reported by a persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: String },

    /// The write was based on an older revision than the store holds.
    #[error("{kind} {id} is at revision {actual}, write was based on {expected}")]
    Conflict {
        kind: RecordKind,
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { kind, id } => EngineError::NotFound { kind, id },
            RepositoryError::Conflict {
                kind,
                id,
                expected,
                actual,
            } => EngineError::Conflict {
                kind,
                id,
                reason: format!("revision {expected} expected, found {actual}"),
            },
            RepositoryError::Unavailable(message) => EngineError::Unavailable { message },
        }
    }
}

/// The slabs of one commission as of one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabSnapshot {
    pub commission_id: CommissionId,
    pub revision: u64,
    pub slabs: Vec<CommissionSlab>,
}

/// A stored record together with the commission revision it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revised<T> {
    pub record: T,
    pub revision: u64,
}

/// Filter for [`SchemeRepository::list_schemes`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeFilter {
    /// Only schemes with this activity flag.
    pub is_active: Option<bool>,
    /// Only schemes owned by this user.
    pub owner_id: Option<UserId>,
}

impl SchemeFilter {
    pub fn matches(&self, scheme: &Scheme) -> bool {
        self.is_active.map_or(true, |active| scheme.is_active == active)
            && self.owner_id.map_or(true, |owner| scheme.owner_id == owner)
    }
}

/// Fields of a scheme the engine may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl SchemeUpdate {
    /// Field checks for the values being set. A name, when given, may not be
    /// blank.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_scheme_fields(self.name.as_deref(), self.description.as_deref())
    }
}

pub trait SlabRepository {
    fn list_slabs(&self, commission_id: CommissionId) -> Result<SlabSnapshot, RepositoryError>;

    fn create_slab(
        &self,
        commission_id: CommissionId,
        draft: &SlabDraft,
        expected_revision: u64,
    ) -> Result<Revised<CommissionSlab>, RepositoryError>;

    fn update_slab(
        &self,
        commission_id: CommissionId,
        slab_id: SlabId,
        patch: &SlabPatch,
        expected_revision: u64,
    ) -> Result<Revised<CommissionSlab>, RepositoryError>;

    /// Returns the commission's revision after the delete.
    fn delete_slab(
        &self,
        commission_id: CommissionId,
        slab_id: SlabId,
        expected_revision: u64,
    ) -> Result<u64, RepositoryError>;
}

pub trait SchemeRepository {
    fn list_schemes(&self, filter: &SchemeFilter) -> Result<Vec<Scheme>, RepositoryError>;

    fn get_scheme(&self, scheme_id: SchemeId) -> Result<Scheme, RepositoryError>;

    fn create_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError>;

    fn update_scheme(&self, scheme_id: SchemeId, update: &SchemeUpdate) -> Result<Scheme, RepositoryError>;
}

#[derive(Debug, Default)]
struct SlabTable {
    revision: u64,
    slabs: Vec<CommissionSlab>,
}

/// Thread-safe in-memory store. Clones share the same data.
///
/// Each commission's slab table sits behind its own lock; the outer map is
/// only write-locked to create a table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    slabs: Arc<RwLock<HashMap<CommissionId, Arc<RwLock<SlabTable>>>>>,
    schemes: Arc<RwLock<Vec<Scheme>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a commission's slabs without validation, bumping its revision.
    pub fn seed_slabs(&self, commission_id: CommissionId, slabs: Vec<CommissionSlab>) -> u64 {
        let table = self.table(commission_id);
        let mut table = table.write();
        table.slabs.extend(slabs);
        table.revision += 1;
        table.revision
    }

    pub fn seed_scheme(&self, scheme: Scheme) {
        self.schemes.write().push(scheme);
    }

    fn table(&self, commission_id: CommissionId) -> Arc<RwLock<SlabTable>> {
        if let Some(table) = self.slabs.read().get(&commission_id) {
            return Arc::clone(table);
        }
        Arc::clone(self.slabs.write().entry(commission_id).or_default())
    }
}

fn check_revision(commission_id: CommissionId, expected: u64, actual: u64) -> Result<(), RepositoryError> {
    if expected == actual {
        Ok(())
    } else {
        tracing::warn!(commission_id = %commission_id, expected, actual, "stale slab write");
        Err(RepositoryError::Conflict {
            kind: RecordKind::Commission,
            id: commission_id.to_string(),
            expected,
            actual,
        })
    }
}

fn slab_not_found(slab_id: SlabId) -> RepositoryError {
    RepositoryError::NotFound {
        kind: RecordKind::Slab,
        id: slab_id.to_string(),
    }
}

impl SlabRepository for InMemoryRepository {
    fn list_slabs(&self, commission_id: CommissionId) -> Result<SlabSnapshot, RepositoryError> {
        let table = self.table(commission_id);
        let table = table.read();
        Ok(SlabSnapshot {
            commission_id,
            revision: table.revision,
            slabs: table.slabs.clone(),
        })
    }

    fn create_slab(
        &self,
        commission_id: CommissionId,
        draft: &SlabDraft,
        expected_revision: u64,
    ) -> Result<Revised<CommissionSlab>, RepositoryError> {
        let table = self.table(commission_id);
        let mut table = table.write();
        check_revision(commission_id, expected_revision, table.revision)?;
        let mut slab = CommissionSlab::from_draft(commission_id, draft);
        slab.updated_at = Some(Utc::now());
        table.slabs.push(slab.clone());
        table.revision += 1;
        Ok(Revised {
            record: slab,
            revision: table.revision,
        })
    }

    fn update_slab(
        &self,
        commission_id: CommissionId,
        slab_id: SlabId,
        patch: &SlabPatch,
        expected_revision: u64,
    ) -> Result<Revised<CommissionSlab>, RepositoryError> {
        let table = self.table(commission_id);
        let mut table = table.write();
        check_revision(commission_id, expected_revision, table.revision)?;
        let slot = table
            .slabs
            .iter_mut()
            .find(|s| s.id == slab_id)
            .ok_or_else(|| slab_not_found(slab_id))?;
        let mut updated = patch.apply_to(slot);
        updated.updated_at = Some(Utc::now());
        *slot = updated.clone();
        table.revision += 1;
        Ok(Revised {
            record: updated,
            revision: table.revision,
        })
    }

    fn delete_slab(
        &self,
        commission_id: CommissionId,
        slab_id: SlabId,
        expected_revision: u64,
    ) -> Result<u64, RepositoryError> {
        let table = self.table(commission_id);
        let mut table = table.write();
        check_revision(commission_id, expected_revision, table.revision)?;
        let index = table
            .slabs
            .iter()
            .position(|s| s.id == slab_id)
            .ok_or_else(|| slab_not_found(slab_id))?;
        table.slabs.remove(index);
        table.revision += 1;
        Ok(table.revision)
    }
}

impl SchemeRepository for InMemoryRepository {
    fn list_schemes(&self, filter: &SchemeFilter) -> Result<Vec<Scheme>, RepositoryError> {
        Ok(self
            .schemes
            .read()
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    fn get_scheme(&self, scheme_id: SchemeId) -> Result<Scheme, RepositoryError> {
        self.schemes
            .read()
            .iter()
            .find(|s| s.id == scheme_id)
            .cloned()
            .ok_or_else(|| scheme_not_found(scheme_id))
    }

    fn create_scheme(&self, mut scheme: Scheme) -> Result<Scheme, RepositoryError> {
        scheme.updated_at = Some(Utc::now());
        self.schemes.write().push(scheme.clone());
        Ok(scheme)
    }

    fn update_scheme(&self, scheme_id: SchemeId, update: &SchemeUpdate) -> Result<Scheme, RepositoryError> {
        let mut schemes = self.schemes.write();
        let scheme = schemes
            .iter_mut()
            .find(|s| s.id == scheme_id)
            .ok_or_else(|| scheme_not_found(scheme_id))?;
        if let Some(name) = &update.name {
            scheme.name = name.clone();
        }
        if let Some(description) = &update.description {
            scheme.description = Some(description.clone());
        }
        if let Some(active) = update.is_active {
            scheme.is_active = active;
        }
        scheme.updated_at = Some(Utc::now());
        Ok(scheme.clone())
    }
}

fn scheme_not_found(scheme_id: SchemeId) -> RepositoryError {
    RepositoryError::NotFound {
        kind: RecordKind::Scheme,
        id: scheme_id.to_string(),
    }
}
