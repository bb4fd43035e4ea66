//! # Per-Role Rate Maps
//!
//! A [`RateMap`] holds one commission rate per [`RateField`]. Records arrive
//! from the persistence collaborator with missing, `null` or blank rate
//! cells; all of those read as zero, so the hierarchy invariant compares
//! well-defined numbers.
//!
//! A [`RatePatch`] is a sparse set of column writes, checked against the
//! actor's editable-field whitelist before it is applied.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::role::{RateField, Role};

/// Deserialize a decimal from a JSON/YAML number, a numeric string, `null`
/// or a blank string. The last two read as zero.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientDecimal)
}

struct LenientDecimal;

impl<'de> Visitor<'de> for LenientDecimal {
    type Value = Decimal;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a number, a numeric string, null or a blank string")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(LenientDecimal)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        Decimal::try_from(v).map_err(|e| E::custom(format!("rate {v} out of range: {e}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Decimal::ZERO);
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// One commission rate per role column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RateMap {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub admin: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub whitelabel: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub masterdistributor: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub distributor: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub retailer: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub customer: Decimal,
}

impl RateMap {
    /// A map with every column at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a map from `(field, rate)` pairs. Unlisted columns are zero.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (RateField, Decimal)>) -> Self {
        let mut map = Self::zero();
        for (field, rate) in pairs {
            map.set(field, rate);
        }
        map
    }

    pub fn get(&self, field: RateField) -> Decimal {
        match field {
            RateField::Admin => self.admin,
            RateField::WhiteLabel => self.whitelabel,
            RateField::MasterDistributor => self.masterdistributor,
            RateField::Distributor => self.distributor,
            RateField::Retailer => self.retailer,
            RateField::Customer => self.customer,
        }
    }

    pub fn set(&mut self, field: RateField, rate: Decimal) {
        let slot = match field {
            RateField::Admin => &mut self.admin,
            RateField::WhiteLabel => &mut self.whitelabel,
            RateField::MasterDistributor => &mut self.masterdistributor,
            RateField::Distributor => &mut self.distributor,
            RateField::Retailer => &mut self.retailer,
            RateField::Customer => &mut self.customer,
        };
        *slot = rate;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: RateField, rate: Decimal) -> Self {
        self.set(field, rate);
        self
    }

    /// The rate paid to `role`. The super admin has no column and earns zero.
    pub fn rate_for(&self, role: Role) -> Decimal {
        role.rate_field()
            .map(|field| self.get(field))
            .unwrap_or(Decimal::ZERO)
    }

    /// Iterate `(field, rate)` in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (RateField, Decimal)> + '_ {
        RateField::all().iter().map(move |f| (*f, self.get(*f)))
    }
}

/// A sparse set of rate-column writes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatePatch(BTreeMap<RateField, Decimal>);

impl RatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: RateField, rate: Decimal) -> Self {
        self.0.insert(field, rate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The columns this patch writes, in chain order.
    pub fn fields(&self) -> impl Iterator<Item = RateField> + '_ {
        self.0.keys().copied()
    }

    /// Return `base` with this patch's columns overwritten.
    pub fn apply_to(&self, base: &RateMap) -> RateMap {
        let mut out = *base;
        for (field, rate) in &self.0 {
            out.set(*field, *rate);
        }
        out
    }
}

/// An inverted adjacent pair in the commission chain: the child column pays
/// more than its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// The child column to highlight.
    pub field: RateField,
    /// The parent column it exceeds.
    pub parent: RateField,
    pub message: String,
}

impl Violation {
    pub fn new(field: RateField, parent: RateField) -> Self {
        Self {
            field,
            parent,
            message: format!("{field} commission cannot exceed {parent}"),
        }
    }
}
