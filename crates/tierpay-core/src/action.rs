//! # Permission Vocabulary
//!
//! The two permission domains the engine gates and the four CRUD actions
//! within each. Both enums are closed: a new action forces every threshold
//! table and every `match` to account for it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// A CRUD action gated by the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// All actions in canonical order.
    pub fn all() -> &'static [Action] {
        &[Self::Create, Self::Read, Self::Update, Self::Delete]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(ValidationError::UnknownAction(s.to_string())),
        }
    }
}

/// The record family a permission check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Commission-policy containers.
    Scheme,
    /// Flat and slab-based commission records, including their slabs.
    Commission,
}

impl Domain {
    pub fn all() -> &'static [Domain] {
        &[Self::Scheme, Self::Commission]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheme => "scheme",
            Self::Commission => "commission",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheme" | "schemes" => Ok(Self::Scheme),
            "commission" | "commissions" => Ok(Self::Commission),
            _ => Err(ValidationError::UnknownDomain(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_is_case_insensitive() {
        assert_eq!("UPDATE".parse::<Action>().unwrap(), Action::Update);
        assert_eq!(" read ".parse::<Action>().unwrap(), Action::Read);
        assert!("approve".parse::<Action>().is_err());
    }

    #[test]
    fn domain_accepts_plural_forms() {
        assert_eq!("schemes".parse::<Domain>().unwrap(), Domain::Scheme);
        assert_eq!("Commission".parse::<Domain>().unwrap(), Domain::Commission);
        assert!("wallet".parse::<Domain>().is_err());
    }

    #[test]
    fn serde_format_matches_as_str() {
        for action in Action::all() {
            let json = serde_json::to_string(action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
        for domain in Domain::all() {
            assert_eq!(domain.to_string(), domain.as_str());
        }
    }
}
