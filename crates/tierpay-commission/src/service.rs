//! # Slab Service
//!
//! Orchestrates a slab mutation end to end:
//!
//! 1. The actor's commission permission is checked. Nothing else runs on
//!    denial.
//! 2. Rate columns outside the actor's whitelist are refused.
//! 3. The candidate is validated against the caller's current snapshot.
//! 4. The store is called with the snapshot's revision.
//! 5. The record the store returns replaces the local candidate.
//!
//! Editor-driven saves additionally move the commission's [`SlabEditor`]
//! through its in-flight slot. The editor lock is not held while the store is called,
//! so a slow save on one commission never blocks another.
//!
//! [`SlabEditor`]: crate::editor::SlabEditor

use tierpay_access::{Actor, PermissionResolver};
use tierpay_core::{Action, CommissionId, Domain, EngineError, RatePatch, RecordKind, SlabId};

use crate::editor::{EditTarget, EditorRegistry};
use crate::model::{CommissionSlab, SlabDraft, SlabPatch};
use crate::repository::SlabRepository;
use crate::slab::SlabSet;

/// A commission's slabs as of the revision they were fetched at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabWorkspace {
    pub set: SlabSet,
    pub revision: u64,
}

impl SlabWorkspace {
    pub fn commission_id(&self) -> CommissionId {
        self.set.commission_id()
    }
}

pub struct SlabService<R> {
    repository: R,
    permissions: PermissionResolver,
    editors: EditorRegistry,
}

impl<R: SlabRepository> SlabService<R> {
    pub fn new(repository: R, permissions: PermissionResolver) -> Self {
        Self {
            repository,
            permissions,
            editors: EditorRegistry::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    pub fn editors(&self) -> &EditorRegistry {
        &self.editors
    }

    /// Fetch a fresh snapshot. The editor's refresh flag is cleared unless
    /// a save is still in flight.
    pub fn refresh(&self, commission_id: CommissionId) -> Result<SlabWorkspace, EngineError> {
        let snapshot = self.repository.list_slabs(commission_id)?;
        let cleared = self.editors.editor(commission_id).lock().mark_refreshed();
        tracing::debug!(
            commission_id = %commission_id,
            revision = snapshot.revision,
            slabs = snapshot.slabs.len(),
            cleared,
            "slab snapshot refreshed"
        );
        Ok(SlabWorkspace {
            set: SlabSet::from_snapshot(commission_id, snapshot.slabs),
            revision: snapshot.revision,
        })
    }

    /// [`refresh`](Self::refresh) gated on commission read permission.
    pub fn load(&self, actor: &Actor, commission_id: CommissionId) -> Result<SlabWorkspace, EngineError> {
        self.permissions.require(&actor.role, Domain::Commission, Action::Read)?;
        self.refresh(commission_id)
    }

    pub fn create(&self, actor: &Actor, workspace: &mut SlabWorkspace, draft: SlabDraft) -> Result<CommissionSlab, EngineError> {
        let commission_id = workspace.commission_id();
        self.try_create(actor, workspace, draft)
            .map_err(|err| rejected("create", commission_id, actor, err))
    }

    pub fn update(
        &self,
        actor: &Actor,
        workspace: &mut SlabWorkspace,
        slab_id: SlabId,
        patch: &SlabPatch,
    ) -> Result<CommissionSlab, EngineError> {
        let commission_id = workspace.commission_id();
        self.try_update(actor, workspace, slab_id, patch)
            .map_err(|err| rejected("update", commission_id, actor, err))
    }

    pub fn delete(&self, actor: &Actor, workspace: &mut SlabWorkspace, slab_id: SlabId) -> Result<(), EngineError> {
        let commission_id = workspace.commission_id();
        self.try_delete(actor, workspace, slab_id)
            .map_err(|err| rejected("delete", commission_id, actor, err))
    }

    fn try_create(&self, actor: &Actor, workspace: &mut SlabWorkspace, draft: SlabDraft) -> Result<CommissionSlab, EngineError> {
        self.permissions.require(&actor.role, Domain::Commission, Action::Create)?;
        self.permissions
            .ensure_fields_editable(&actor.role, &written_columns(&draft))?;
        workspace.set.validate(&draft, None)?;

        let created = self
            .repository
            .create_slab(workspace.commission_id(), &draft, workspace.revision)?;
        workspace.set.merge(created.record.clone());
        workspace.revision = created.revision;
        tracing::debug!(
            commission_id = %workspace.commission_id(),
            slab_id = %created.record.id,
            actor = %actor.id,
            "slab created"
        );
        Ok(created.record)
    }

    fn try_update(
        &self,
        actor: &Actor,
        workspace: &mut SlabWorkspace,
        slab_id: SlabId,
        patch: &SlabPatch,
    ) -> Result<CommissionSlab, EngineError> {
        self.permissions.require(&actor.role, Domain::Commission, Action::Update)?;
        let current = workspace.set.get(slab_id).ok_or_else(|| EngineError::NotFound {
            kind: RecordKind::Slab,
            id: slab_id.to_string(),
        })?;
        self.permissions
            .ensure_fields_editable(&actor.role, &changed_columns(current, patch))?;
        workspace.set.preview_update(slab_id, patch)?;

        let updated = self
            .repository
            .update_slab(workspace.commission_id(), slab_id, patch, workspace.revision)?;
        workspace.set.merge(updated.record.clone());
        workspace.revision = updated.revision;
        tracing::debug!(
            commission_id = %workspace.commission_id(),
            slab_id = %slab_id,
            actor = %actor.id,
            "slab updated"
        );
        Ok(updated.record)
    }

    fn try_delete(&self, actor: &Actor, workspace: &mut SlabWorkspace, slab_id: SlabId) -> Result<(), EngineError> {
        self.permissions.require(&actor.role, Domain::Commission, Action::Delete)?;
        if workspace.set.get(slab_id).is_none() {
            return Err(EngineError::NotFound {
                kind: RecordKind::Slab,
                id: slab_id.to_string(),
            });
        }
        let revision = self
            .repository
            .delete_slab(workspace.commission_id(), slab_id, workspace.revision)?;
        workspace.set.remove(slab_id);
        workspace.revision = revision;
        tracing::debug!(
            commission_id = %workspace.commission_id(),
            slab_id = %slab_id,
            actor = %actor.id,
            "slab deleted"
        );
        Ok(())
    }

    /// Open a row in the commission's editor, seeded from the workspace.
    /// A `New` target starts from the blank row.
    pub fn start_edit(&self, workspace: &SlabWorkspace, target: EditTarget) -> Result<(), EngineError> {
        let initial = match target {
            EditTarget::New => SlabDraft::default(),
            EditTarget::Slab(slab_id) => workspace
                .set
                .get(slab_id)
                .map(CommissionSlab::to_draft)
                .ok_or_else(|| EngineError::NotFound {
                    kind: RecordKind::Slab,
                    id: slab_id.to_string(),
                })?,
        };
        self.editors
            .editor(workspace.commission_id())
            .lock()
            .start_edit(target, initial)
    }

    /// Save the editor's open row. On failure the editor keeps the draft
    /// and the error, or closes and demands a refresh for stale snapshots.
    pub fn save_edit(&self, actor: &Actor, workspace: &mut SlabWorkspace) -> Result<CommissionSlab, EngineError> {
        let editor = self.editors.editor(workspace.commission_id());
        let (target, draft) = editor.lock().begin_save()?;

        let outcome = match target {
            EditTarget::New => self.create(actor, workspace, draft),
            EditTarget::Slab(slab_id) => self.update(actor, workspace, slab_id, &SlabPatch::from_draft(&draft)),
        };

        let mut editor = editor.lock();
        match outcome {
            Ok(record) => {
                editor.save_succeeded()?;
                Ok(record)
            }
            Err(err) => {
                editor.save_failed(err.clone())?;
                Err(err)
            }
        }
    }

    /// Drop the editor's open row and reload the snapshot.
    pub fn discard_edit(&self, workspace: &mut SlabWorkspace) -> Result<(), EngineError> {
        let commission_id = workspace.commission_id();
        self.editors.editor(commission_id).lock().discard()?;
        *workspace = self.refresh(commission_id)?;
        Ok(())
    }
}

fn rejected(op: &'static str, commission_id: CommissionId, actor: &Actor, err: EngineError) -> EngineError {
    tracing::warn!(
        commission_id = %commission_id,
        actor = %actor.id,
        op,
        error = %err,
        refresh = err.requires_refresh(),
        "slab mutation rejected"
    );
    err
}

/// Columns a new slab writes: every non-zero rate.
fn written_columns(draft: &SlabDraft) -> RatePatch {
    draft
        .rates
        .iter()
        .filter(|(_, rate)| !rate.is_zero())
        .fold(RatePatch::new(), |patch, (field, rate)| patch.set(field, rate))
}

/// Columns a patch actually changes relative to `current`.
fn changed_columns(current: &CommissionSlab, patch: &SlabPatch) -> RatePatch {
    patch
        .rates
        .apply_to(&current.rates)
        .iter()
        .filter(|(field, rate)| current.rates.get(*field) != *rate)
        .fold(RatePatch::new(), |out, (field, rate)| out.set(field, rate))
}
