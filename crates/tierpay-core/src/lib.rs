//! # tierpay-core: Foundational Types for the Commission Engine
//!
//! This crate is the leaf of the tierpay workspace. It defines the closed
//! role vocabulary of the reseller network, the immutable role table that
//! ranks those roles, and the error taxonomy every other crate reports
//! through.
//!
//! ## Key Design Principles
//!
//! 1. **Closed role enum.** Role strings are normalized once at the system
//!    boundary ([`RoleHierarchy::resolve`]) into [`ResolvedRole`]. All rules
//!    downstream match on [`Role`], never on raw strings.
//!
//! 2. **Injected role table.** Levels, aliases, permission thresholds and
//!    editable-field whitelists live in one [`RoleTable`] value, loaded once
//!    and shared by `Arc`. There are no ambient lookup tables.
//!
//! 3. **Decimal rates.** Commission rates and transaction amounts are
//!    `rust_decimal::Decimal`. Missing or blank rates read as zero.
//!
//! 4. **Structured errors.** [`EngineError`] carries field-tagged context so
//!    callers can highlight the offending input in place.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tierpay-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod action;
pub mod error;
pub mod hierarchy;
pub mod identity;
pub mod rates;
pub mod role;
pub mod table;

// Re-export primary types for ergonomic imports.
pub use action::{Action, Domain};
pub use error::{ConfigError, EngineError, FieldError, RecordKind, ValidationError};
pub use hierarchy::{RoleHierarchy, RoleInfo};
pub use identity::{CommissionId, OperatorId, SchemeId, SlabId, UserId};
pub use rates::{RateMap, RatePatch, Violation};
pub use role::{Level, RateField, ResolvedRole, Role, COMMISSION_CHAIN};
pub use table::{ActionThresholds, RoleTable, ROLE_TABLE_ENV};
