//! # Roles: Single Source of Truth
//!
//! Defines the seven canonical roles of the reseller network and the six
//! rate columns a commission record carries. Every `match` on [`Role`] or
//! [`RateField`] must be exhaustive.
//!
//! ## Levels
//!
//! A [`Level`] is the rank the role table assigns to a role: `0` is the
//! highest authority, larger numbers are more junior. Unrecognized role
//! strings rank at [`Level::UNRANKED`] (999), below every known role.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// The canonical roles of the reseller network, in descending authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "super_admin")]
    SuperAdmin,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "whitelabel")]
    WhiteLabel,
    #[serde(rename = "masterdistributor")]
    MasterDistributor,
    #[serde(rename = "distributor")]
    Distributor,
    #[serde(rename = "retailer")]
    Retailer,
    #[serde(rename = "customer")]
    Customer,
}

impl Role {
    /// All roles in chain order, highest authority first.
    pub fn all() -> &'static [Role] {
        &[
            Self::SuperAdmin,
            Self::Admin,
            Self::WhiteLabel,
            Self::MasterDistributor,
            Self::Distributor,
            Self::Retailer,
            Self::Customer,
        ]
    }

    /// The canonical snake-case name. Matches the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::WhiteLabel => "whitelabel",
            Self::MasterDistributor => "masterdistributor",
            Self::Distributor => "distributor",
            Self::Retailer => "retailer",
            Self::Customer => "customer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::Admin => "Admin",
            Self::WhiteLabel => "Whitelabel",
            Self::MasterDistributor => "Master Distributor",
            Self::Distributor => "Distributor",
            Self::Retailer => "Retailer",
            Self::Customer => "Customer",
        }
    }

    /// The rate column this role is paid from. The super admin has no
    /// column of its own.
    pub fn rate_field(&self) -> Option<RateField> {
        match self {
            Self::SuperAdmin => None,
            Self::Admin => Some(RateField::Admin),
            Self::WhiteLabel => Some(RateField::WhiteLabel),
            Self::MasterDistributor => Some(RateField::MasterDistributor),
            Self::Distributor => Some(RateField::Distributor),
            Self::Retailer => Some(RateField::Retailer),
            Self::Customer => Some(RateField::Customer),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Parse a canonical role name, case-insensitively. Aliases are the
    /// role table's concern; see [`crate::RoleHierarchy::resolve`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

/// One per-role rate column of a commission or slab record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RateField {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "whitelabel")]
    WhiteLabel,
    #[serde(rename = "masterdistributor")]
    MasterDistributor,
    #[serde(rename = "distributor")]
    Distributor,
    #[serde(rename = "retailer")]
    Retailer,
    #[serde(rename = "customer")]
    Customer,
}

/// The fixed parent-to-child chain the commission hierarchy invariant walks.
pub const COMMISSION_CHAIN: [RateField; 6] = [
    RateField::Admin,
    RateField::WhiteLabel,
    RateField::MasterDistributor,
    RateField::Distributor,
    RateField::Retailer,
    RateField::Customer,
];

impl RateField {
    /// All rate fields in chain order.
    pub fn all() -> &'static [RateField] {
        &COMMISSION_CHAIN
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::WhiteLabel => "whitelabel",
            Self::MasterDistributor => "masterdistributor",
            Self::Distributor => "distributor",
            Self::Retailer => "retailer",
            Self::Customer => "customer",
        }
    }

    /// The role paid from this column.
    pub fn role(&self) -> Role {
        match self {
            Self::Admin => Role::Admin,
            Self::WhiteLabel => Role::WhiteLabel,
            Self::MasterDistributor => Role::MasterDistributor,
            Self::Distributor => Role::Distributor,
            Self::Retailer => Role::Retailer,
            Self::Customer => Role::Customer,
        }
    }
}

impl std::fmt::Display for RateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "admin" => Ok(Self::Admin),
            "whitelabel" => Ok(Self::WhiteLabel),
            "masterdistributor" | "mds" => Ok(Self::MasterDistributor),
            "distributor" => Ok(Self::Distributor),
            "retailer" => Ok(Self::Retailer),
            "customer" => Ok(Self::Customer),
            _ => Err(ValidationError::UnknownRateField(s.to_string())),
        }
    }
}

/// Rank in the role hierarchy. Lower is more senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u16);

impl Level {
    /// The highest authority.
    pub const TOP: Level = Level(0);

    /// Rank of any role string the table does not recognize.
    pub const UNRANKED: Level = Level(999);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn is_ranked(&self) -> bool {
        *self != Self::UNRANKED
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A role string after boundary normalization.
///
/// The raw text of an unrecognized role is kept so it can be echoed back in
/// diagnostics and display names; it never participates in a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "role")]
pub enum ResolvedRole {
    Known(Role),
    Unrecognized(String),
}

impl ResolvedRole {
    pub fn known(&self) -> Option<Role> {
        match self {
            Self::Known(role) => Some(*role),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<Role> for ResolvedRole {
    fn from(role: Role) -> Self {
        Self::Known(role)
    }
}

impl std::fmt::Display for ResolvedRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(role) => f.write_str(role.as_str()),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}
