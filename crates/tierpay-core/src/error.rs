//! # Error Hierarchy
//!
//! Structured error types for the commission engine, built with `thiserror`.
//!
//! [`EngineError`] is the taxonomy every query and command reports through.
//! Validation failures carry the offending field so callers can render the
//! message next to the input that caused it; see [`EngineError::field_errors`].
//!
//! ## Propagation
//!
//! - `PermissionDenied` is checked before any mutation and is never retried.
//! - `Range`, `Overlap`, `Hierarchy` are recoverable by editing the input.
//! - `Conflict` requires a refetch and a deliberate re-apply.
//! - `NotFound` ends the operation and forces a refresh.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::{Action, Domain};
use crate::identity::SlabId;
use crate::rates::Violation;
use crate::role::RateField;

/// The record family named in `NotFound` and `Conflict` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Scheme,
    Commission,
    Slab,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Scheme => "scheme",
            Self::Commission => "commission",
            Self::Slab => "slab",
        })
    }
}

/// Top-level error type for the commission engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Slab bounds or a quoted amount are malformed.
    #[error("range error on {field}: {message}")]
    Range {
        /// The input that failed (`slab_min`, `slab_max`, `amount`).
        field: &'static str,
        message: String,
    },

    /// A new or edited slab intersects an existing active slab.
    #[error("slab range overlaps with existing slab {conflicting_slab_id}")]
    Overlap { conflicting_slab_id: SlabId },

    /// One or more adjacent parent/child rate pairs invert.
    #[error("commission hierarchy violated: {}", summarize(.violations))]
    Hierarchy { violations: Vec<Violation> },

    /// A record's descriptive fields are missing or too long.
    #[error("invalid input: {}", summarize_fields(.errors))]
    InvalidFields { errors: Vec<FieldError> },

    /// The actor's role lacks the action in the domain.
    #[error("permission denied: cannot {action} {domain}")]
    PermissionDenied { action: Action, domain: Domain },

    /// The actor attempted to write a rate column outside its whitelist.
    #[error("role '{role}' may not edit the {field} commission field")]
    FieldNotEditable { role: String, field: RateField },

    /// The referenced record is absent from the supplied snapshot.
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: String },

    /// The persistence collaborator reported the snapshot was stale.
    #[error("{kind} {id} changed since it was fetched: {reason}")]
    Conflict {
        kind: RecordKind,
        id: String,
        reason: String,
    },

    /// An editor transition was refused because another edit is unresolved.
    #[error("edit of {current} must be saved or discarded first")]
    EditInProgress { current: String },

    /// A save or discard was requested with no edit open.
    #[error("no slab edit is in progress")]
    NoActiveEdit,

    /// The persistence collaborator could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn summarize_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A message bound to the input field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl EngineError {
    /// Whether the user can recover by editing the input and resubmitting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Range { .. }
                | Self::Overlap { .. }
                | Self::Hierarchy { .. }
                | Self::InvalidFields { .. }
                | Self::FieldNotEditable { .. }
                | Self::EditInProgress { .. }
        )
    }

    /// Whether the caller must refetch its snapshot before continuing.
    pub fn requires_refresh(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Conflict { .. })
    }

    /// Field-tagged messages for inline display. Errors that are not about
    /// a specific input yield an empty list.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Range { field, message } => vec![FieldError {
                field: (*field).to_string(),
                message: message.clone(),
            }],
            Self::Overlap { .. } => vec![FieldError {
                field: "range".to_string(),
                message: "Slab range overlaps with existing slab".to_string(),
            }],
            Self::Hierarchy { violations } => violations
                .iter()
                .map(|v| FieldError {
                    field: v.field.as_str().to_string(),
                    message: v.message.clone(),
                })
                .collect(),
            Self::InvalidFields { errors } => errors.clone(),
            Self::FieldNotEditable { field, .. } => vec![FieldError {
                field: field.as_str().to_string(),
                message: self.to_string(),
            }],
            Self::PermissionDenied { .. }
            | Self::NotFound { .. }
            | Self::Conflict { .. }
            | Self::EditInProgress { .. }
            | Self::NoActiveEdit
            | Self::Unavailable { .. } => Vec::new(),
        }
    }
}

/// Errors loading or validating a role table.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The role table file could not be read.
    #[error("cannot read role table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The role table is not valid YAML for the expected structure.
    #[error("role table parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The role table parsed but breaks a structural rule.
    #[error("invalid role table: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },
}

/// Validation errors for boundary parsing of identifiers and enums.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown role: {0:?}")]
    UnknownRole(String),

    #[error("unknown commission rate field: {0:?}")]
    UnknownRateField(String),

    #[error("unknown action: {0:?} (expected create, read, update or delete)")]
    UnknownAction(String),

    #[error("unknown permission domain: {0:?} (expected scheme or commission)")]
    UnknownDomain(String),

    #[error("invalid {kind} identifier: {value:?}")]
    InvalidId { kind: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(field: RateField, parent: RateField) -> Violation {
        Violation::new(field, parent)
    }

    #[test]
    fn hierarchy_display_joins_messages() {
        let err = EngineError::Hierarchy {
            violations: vec![
                violation(RateField::WhiteLabel, RateField::Admin),
                violation(RateField::Customer, RateField::Retailer),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("whitelabel commission cannot exceed admin"));
        assert!(msg.contains("customer commission cannot exceed retailer"));
    }

    #[test]
    fn invalid_fields_are_recoverable_and_tagged() {
        let err = EngineError::InvalidFields {
            errors: vec![FieldError {
                field: "name".into(),
                message: "Scheme name is required".into(),
            }],
        };
        assert_eq!(err.to_string(), "invalid input: Scheme name is required");
        assert!(err.is_recoverable());
        assert_eq!(err.field_errors()[0].field, "name");
    }

    #[test]
    fn permission_denied_display() {
        let err = EngineError::PermissionDenied {
            action: Action::Delete,
            domain: Domain::Commission,
        };
        assert_eq!(err.to_string(), "permission denied: cannot delete commission");
        assert!(!err.is_recoverable());
        assert!(!err.requires_refresh());
    }

    #[test]
    fn hierarchy_field_errors_are_tagged_by_child_field() {
        let err = EngineError::Hierarchy {
            violations: vec![violation(RateField::WhiteLabel, RateField::Admin)],
        };
        let fields = err.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "whitelabel");
        assert!(err.is_recoverable());
    }

    #[test]
    fn conflict_and_not_found_force_refresh() {
        let conflict = EngineError::Conflict {
            kind: RecordKind::Slab,
            id: "x".into(),
            reason: "revision 3 expected, found 4".into(),
        };
        assert!(conflict.requires_refresh());
        assert!(!conflict.is_recoverable());
        assert!(conflict.field_errors().is_empty());

        let missing = EngineError::NotFound {
            kind: RecordKind::Commission,
            id: "y".into(),
        };
        assert_eq!(missing.to_string(), "commission y not found");
        assert!(missing.requires_refresh());
    }

    #[test]
    fn range_error_names_its_field() {
        let err = EngineError::Range {
            field: "slab_max",
            message: "Maximum amount must be greater than minimum".into(),
        };
        assert_eq!(err.field_errors()[0].field, "slab_max");
        assert!(err.to_string().starts_with("range error on slab_max"));
    }

    #[test]
    fn config_invalid_lists_every_error() {
        let err = ConfigError::Invalid {
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "invalid role table: a; b");
    }

    #[test]
    fn unavailable_is_neither_recoverable_nor_a_refresh() {
        let err = EngineError::Unavailable {
            message: "connection reset".into(),
        };
        assert!(!err.is_recoverable());
        assert!(!err.requires_refresh());
        assert_eq!(err.to_string(), "store unavailable: connection reset");
    }
}
