//! # tierpay-commission: Commission and Slab Rules
//!
//! Everything about how much each tier of the reseller network earns:
//!
//! - **Records** (`model.rs`): commissions, slabs, drafts and patches.
//! - **Hierarchy validation** (`validator.rs`): parent rate ≥ child rate
//!   down the fixed chain, reported per offending column.
//! - **Slab sets** (`slab.rs`): non-overlapping `[min, max)` bands per
//!   commission, and rate resolution for an amount.
//! - **Display ordering** (`sort.rs`): stable column sorts.
//! - **Editing** (`editor.rs`): the one-row-at-a-time editing state
//!   machine, one per commission.
//! - **Persistence seam** (`repository.rs`): store traits with optimistic
//!   revisions, plus an in-memory store.
//! - **Orchestration** (`service.rs`): permission, validation, store call
//!   and merge, in that order. Scheme writes go through `schemes.rs`
//!   the same way.
//! - **Quoting** (`quote.rs`) and **batch import planning** (`batch.rs`).
//!
//! ## Crate Policy
//!
//! - Validation never mutates on failure.
//! - The engine does not retry store conflicts; callers refetch.

pub mod batch;
pub mod editor;
pub mod model;
pub mod quote;
pub mod repository;
pub mod schemes;
pub mod service;
pub mod slab;
pub mod sort;
pub mod validator;

pub use batch::{plan_batch, BatchPlan, BatchReport, CommissionEntry, EntryError};
pub use editor::{EditTarget, EditorRegistry, EditorState, PendingSave, SlabEditor};
pub use model::{Commission, CommissionSlab, CommissionType, SlabDraft, SlabPatch};
pub use quote::{quote, Quote};
pub use repository::{
    InMemoryRepository, RepositoryError, Revised, SchemeFilter, SchemeRepository, SchemeUpdate, SlabRepository,
    SlabSnapshot,
};
pub use schemes::SchemeService;
pub use service::{SlabService, SlabWorkspace};
pub use slab::{check_range, SlabSet};
pub use sort::{sort_slabs, SlabSort, SlabSortField, SortDirection};
pub use validator::CommissionHierarchyValidator;
