//! # tierpay-access: Permission and Scheme Access Rules
//!
//! Pure query functions the presentation layer calls to decide what to
//! render and what to allow. Nothing here performs I/O or keeps
//! per-request state; every answer is a function of the injected role
//! table and the arguments.
//!
//! - **Permissions** (`permission.rs`): CRUD permission booleans per
//!   domain, the editable commission-field whitelist, and field rules.
//!
//! - **Actors** (`actor.rs`): the `{id, role}` pair supplied by the
//!   identity provider, normalized at construction.
//!
//! - **Schemes** (`scheme.rs`): scheme records and the three-way
//!   ownership / sharing / hierarchy access evaluation.
//!
//! ## Crate Policy
//!
//! - Depends only on `tierpay-core` internally.
//! - Unrecognized roles are denied every action, including read.

pub mod actor;
pub mod permission;
pub mod scheme;

pub use actor::Actor;
pub use permission::{FieldRule, PermissionResolver, PermissionSet};
pub use scheme::{
    check_scheme_fields, AccessGrant, Scheme, SchemeAccessEvaluator, ShareGrant, SharePermission,
    MAX_SCHEME_DESCRIPTION_CHARS, MAX_SCHEME_NAME_CHARS,
};
