//! # Identity Newtypes
//!
//! Identifier newtypes for every record the engine reasons about. Each is a
//! distinct type: a [`SlabId`] cannot be passed where a [`CommissionId`] is
//! expected, and an actor's [`UserId`] cannot be confused with a scheme's.
//!
//! All identifiers are UUID-backed and valid by construction. Parsing from
//! text (CLI arguments, fixture files) goes through `FromStr`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

uuid_identifier!(
    /// A member of the reseller network acting through the engine.
    UserId,
    "user"
);

uuid_identifier!(
    /// A commission-policy container.
    SchemeId,
    "scheme"
);

uuid_identifier!(
    /// A flat or slab-based commission record within a scheme.
    CommissionId,
    "commission"
);

uuid_identifier!(
    /// One amount band of a slab-based commission.
    SlabId,
    "slab"
);

uuid_identifier!(
    /// A service operator (biller, bank, telecom) a commission applies to.
    OperatorId,
    "operator"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identifiers_are_unique() {
        assert_ne!(SlabId::new(), SlabId::new());
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = CommissionId::new();
        let parsed: CommissionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn invalid_text_names_the_identifier_kind() {
        let err = "not-a-uuid".parse::<SchemeId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidId {
                kind: "scheme",
                value: "not-a-uuid".into()
            }
        );
    }

    #[test]
    fn serde_is_transparent() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{uuid}\""));
        assert_eq!(id.as_uuid(), &uuid);
    }
}
