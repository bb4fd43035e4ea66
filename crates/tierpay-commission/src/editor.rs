//! # Slab Editing State Machine
//!
//! One editor per commission tracks two things: the slab row open for
//! editing, if any, and the save submitted to the store, if any.
//!
//! ```text
//! Idle ──start_edit──▶ Editing(target) ──begin_save──▶ Saving(target)
//!  ▲                     │    ▲                           │      │
//!  └──────discard────────┘    └──────save_failed──────────┘      │
//!  ▲                                                             │
//!  └──────────────save_succeeded / save_failed(conflict)─────────┘
//! ```
//!
//! `begin_save` moves the open row into the in-flight slot, so another row
//! can be opened while the store works. Only one row is open at a time:
//! switching from an open row to a different target is refused with
//! [`EngineError::EditInProgress`] until that row has been submitted or
//! discarded. Only one save is in flight at a time.
//!
//! The in-flight save is always resolved by `save_succeeded` or
//! `save_failed`, never dropped. A failed save reopens its row with the
//! error and the user's input. If another row was opened in the meantime,
//! the failed row waits and reopens once that row is submitted or
//! discarded. A conflict or a discard flags that the snapshot must be
//! refetched.
//!
//! Editors for different commissions are independent: [`EditorRegistry`]
//! hands out one lock per commission and holds no lock across them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tierpay_core::{CommissionId, EngineError, SlabId};

use crate::model::SlabDraft;

/// The row being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "slab_id")]
pub enum EditTarget {
    /// The provisional row for a slab that does not exist yet.
    New,
    Slab(SlabId),
}

impl std::fmt::Display for EditTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => f.write_str("new slab"),
            Self::Slab(id) => write!(f, "slab {id}"),
        }
    }
}

/// The open row.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Idle,
    Editing {
        target: EditTarget,
        draft: SlabDraft,
        /// The error from the last failed save, if any.
        error: Option<EngineError>,
    },
}

impl EditorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Editing { .. } => "editing",
        }
    }
}

/// A row submitted to the store whose outcome is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSave {
    pub target: EditTarget,
    pub draft: SlabDraft,
}

/// Editing state for the slab table of one commission.
#[derive(Debug, Clone)]
pub struct SlabEditor {
    commission_id: CommissionId,
    state: EditorState,
    in_flight: Option<PendingSave>,
    /// A failed save waiting for the open row to be resolved.
    returned: Option<EditorState>,
    needs_refresh: bool,
}

impl SlabEditor {
    pub fn new(commission_id: CommissionId) -> Self {
        Self {
            commission_id,
            state: EditorState::Idle,
            in_flight: None,
            returned: None,
            needs_refresh: false,
        }
    }

    pub fn commission_id(&self) -> CommissionId {
        self.commission_id
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// No open row, no save in flight and no failed save waiting.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, EditorState::Idle) && self.in_flight.is_none() && self.returned.is_none()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&PendingSave> {
        self.in_flight.as_ref()
    }

    /// The target of the open row.
    pub fn target(&self) -> Option<EditTarget> {
        match &self.state {
            EditorState::Idle => None,
            EditorState::Editing { target, .. } => Some(*target),
        }
    }

    /// Whether the local snapshot must be refetched before it is trusted.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Record that a fresh snapshot has been loaded. A save still in flight
    /// will change the store after this fetch, so the flag stays set until
    /// no save is pending. An open row is unaffected: its draft is checked
    /// against whatever snapshot is current when it is saved.
    pub fn mark_refreshed(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.needs_refresh = false;
        true
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        match &self.state {
            EditorState::Editing { error, .. } => error.as_ref(),
            EditorState::Idle => None,
        }
    }

    /// Open `target` for editing with `initial` as the working copy.
    ///
    /// Re-opening the open row keeps its draft. A different target is
    /// refused while a row is open, and the row being saved cannot be
    /// reopened until its save resolves.
    pub fn start_edit(&mut self, target: EditTarget, initial: SlabDraft) -> Result<(), EngineError> {
        if let EditorState::Editing { target: current, .. } = &self.state {
            if *current == target {
                return Ok(());
            }
            return Err(self.refuse(*current, target));
        }
        if let Some(pending) = self.in_flight {
            if pending.target == target {
                return Err(self.refuse(pending.target, target));
            }
        }
        tracing::debug!(
            commission_id = %self.commission_id,
            %target,
            saving = self.in_flight.is_some(),
            "edit started"
        );
        self.state = EditorState::Editing {
            target,
            draft: initial,
            error: None,
        };
        Ok(())
    }

    fn refuse(&self, current: EditTarget, requested: EditTarget) -> EngineError {
        tracing::warn!(
            commission_id = %self.commission_id,
            current = %current,
            requested = %requested,
            "edit switch refused"
        );
        EngineError::EditInProgress {
            current: current.to_string(),
        }
    }

    /// Mutable access to the working copy of the open row.
    pub fn draft_mut(&mut self) -> Option<&mut SlabDraft> {
        match &mut self.state {
            EditorState::Editing { draft, .. } => Some(draft),
            EditorState::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&SlabDraft> {
        match &self.state {
            EditorState::Editing { draft, .. } => Some(draft),
            EditorState::Idle => None,
        }
    }

    /// Submit the open row and hand back what should be sent to the store.
    pub fn begin_save(&mut self) -> Result<(EditTarget, SlabDraft), EngineError> {
        let (target, draft) = match &self.state {
            EditorState::Editing { target, draft, .. } => (*target, *draft),
            EditorState::Idle => return Err(EngineError::NoActiveEdit),
        };
        if let Some(pending) = self.in_flight {
            return Err(EngineError::EditInProgress {
                current: pending.target.to_string(),
            });
        }
        self.in_flight = Some(PendingSave { target, draft });
        self.state = self.returned.take().unwrap_or(EditorState::Idle);
        Ok((target, draft))
    }

    /// The in-flight save was accepted by the store.
    pub fn save_succeeded(&mut self) -> Result<EditTarget, EngineError> {
        let pending = self.in_flight.take().ok_or(EngineError::NoActiveEdit)?;
        tracing::debug!(commission_id = %self.commission_id, target = %pending.target, "edit saved");
        Ok(pending.target)
    }

    /// The in-flight save failed. Stale-snapshot errors close it and demand
    /// a refresh. Anything else reopens the row with the error, or parks it
    /// until the row opened meanwhile is resolved.
    pub fn save_failed(&mut self, error: EngineError) -> Result<(), EngineError> {
        let PendingSave { target, draft } = self.in_flight.take().ok_or(EngineError::NoActiveEdit)?;
        tracing::warn!(commission_id = %self.commission_id, %target, %error, "edit save failed");
        if error.requires_refresh() {
            self.needs_refresh = true;
            return Ok(());
        }
        let reopened = EditorState::Editing {
            target,
            draft,
            error: Some(error),
        };
        if matches!(self.state, EditorState::Idle) {
            self.state = reopened;
        } else {
            self.returned = Some(reopened);
        }
        Ok(())
    }

    /// Drop the open row. The caller must refetch before trusting local
    /// state again. A save already in flight is not affected and cannot be
    /// discarded.
    pub fn discard(&mut self) -> Result<Option<EditTarget>, EngineError> {
        match &self.state {
            EditorState::Editing { target, .. } => {
                let target = *target;
                tracing::debug!(commission_id = %self.commission_id, %target, "edit discarded");
                self.state = self.returned.take().unwrap_or(EditorState::Idle);
                self.needs_refresh = true;
                Ok(Some(target))
            }
            EditorState::Idle => match self.in_flight {
                Some(pending) => Err(EngineError::EditInProgress {
                    current: pending.target.to_string(),
                }),
                None => Ok(None),
            },
        }
    }
}

/// One [`SlabEditor`] per commission, created on first use.
#[derive(Debug, Clone, Default)]
pub struct EditorRegistry {
    editors: Arc<RwLock<HashMap<CommissionId, Arc<Mutex<SlabEditor>>>>>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The editor for `commission_id`. The registry lock is released
    /// before the caller locks the editor.
    pub fn editor(&self, commission_id: CommissionId) -> Arc<Mutex<SlabEditor>> {
        if let Some(editor) = self.editors.read().get(&commission_id) {
            return Arc::clone(editor);
        }
        let mut editors = self.editors.write();
        Arc::clone(
            editors
                .entry(commission_id)
                .or_insert_with(|| Arc::new(Mutex::new(SlabEditor::new(commission_id)))),
        )
    }

    /// Forget the editor of a commission that is no longer displayed.
    pub fn release(&self, commission_id: CommissionId) -> bool {
        self.editors.write().remove(&commission_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.editors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
