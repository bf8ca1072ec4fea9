//! Domain identifiers and filter values.
//!
//! These types live in `core` so that the CLI and the agent pipeline
//! can share them without circular dependencies. A [`DomainName`] is
//! one of the four independent business stores; a [`FilterValue`] is a
//! scalar or a list of scalars destined for a literal WHERE clause.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the four independent business domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DomainName {
    /// Users, products, and orders.
    ShopCore,
    /// Shipments, warehouses, and tracking events.
    ShipStream,
    /// Wallets, transactions, and payment methods.
    PayGuard,
    /// Tickets, messages, and satisfaction surveys.
    CareDesk,
}

impl DomainName {
    /// All domains in their canonical order.
    pub const ALL: [Self; 4] = [
        Self::ShopCore,
        Self::ShipStream,
        Self::PayGuard,
        Self::CareDesk,
    ];

    /// Parses a domain name (exact match).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ShopCore" => Some(Self::ShopCore),
            "ShipStream" => Some(Self::ShipStream),
            "PayGuard" => Some(Self::PayGuard),
            "CareDesk" => Some(Self::CareDesk),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ShopCore => "ShopCore",
            Self::ShipStream => "ShipStream",
            Self::PayGuard => "PayGuard",
            Self::CareDesk => "CareDesk",
        }
    }

    /// Default database file name for this domain's store.
    #[must_use]
    pub const fn db_file(&self) -> &'static str {
        match self {
            Self::ShopCore => "shopcore.db",
            Self::ShipStream => "shipstream.db",
            Self::PayGuard => "payguard.db",
            Self::CareDesk => "caredesk.db",
        }
    }
}

impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single literal value for a WHERE condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Integer value, emitted unquoted.
    Int(i64),
    /// Floating-point value, emitted unquoted.
    Float(f64),
    /// Text value, emitted single-quoted.
    Text(String),
    /// Boolean value, emitted as `1`/`0`.
    Bool(bool),
}

impl Scalar {
    /// Whether this scalar renders as a bare numeric literal.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Converts a JSON value from a result row into a scalar, when
    /// the value has a usable literal representation.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Int).or_else(|| {
                n.as_f64().map(Self::Float)
            }),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }
}

/// A filter value: a scalar, or a list produced by fan-out from
/// multiple upstream rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Single value, rendered as an equality condition.
    One(Scalar),
    /// Multiple values, rendered as an `IN (...)` condition when the
    /// list is type-uniform.
    Many(Vec<Scalar>),
}

impl FilterValue {
    /// Convenience constructor for an integer filter.
    #[must_use]
    pub const fn int(v: i64) -> Self {
        Self::One(Scalar::Int(v))
    }

    /// Convenience constructor for a text filter.
    #[must_use]
    pub fn text(v: impl Into<String>) -> Self {
        Self::One(Scalar::Text(v.into()))
    }

    /// Collapses a non-empty list to a scalar when it holds exactly
    /// one value; returns `None` for an empty list.
    #[must_use]
    pub fn from_values(mut values: Vec<Scalar>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::One),
            _ => Some(Self::Many(values)),
        }
    }
}

/// Filter set for one agent invocation, keyed by column name.
///
/// A `BTreeMap` keeps condition order deterministic, which matters for
/// the literal SQL the splicing layer emits.
pub type FilterMap = BTreeMap<String, FilterValue>;

/// A result row: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse() {
        assert_eq!(DomainName::parse("ShopCore"), Some(DomainName::ShopCore));
        assert_eq!(DomainName::parse("CareDesk"), Some(DomainName::CareDesk));
        assert_eq!(DomainName::parse("shopcore"), None);
        assert_eq!(DomainName::parse("Unknown"), None);
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(DomainName::ShipStream.to_string(), "ShipStream");
        assert_eq!(DomainName::PayGuard.to_string(), "PayGuard");
    }

    #[test]
    fn test_domain_serde_roundtrip() {
        let json = serde_json::to_string(&DomainName::PayGuard).unwrap_or_default();
        assert_eq!(json, "\"PayGuard\"");
        let parsed: DomainName =
            serde_json::from_str(&json).unwrap_or(DomainName::ShopCore);
        assert_eq!(parsed, DomainName::PayGuard);
    }

    #[test]
    fn test_scalar_from_json() {
        assert_eq!(
            Scalar::from_json(&serde_json::json!(42)),
            Some(Scalar::Int(42))
        );
        assert_eq!(
            Scalar::from_json(&serde_json::json!("abc")),
            Some(Scalar::Text("abc".to_string()))
        );
        assert_eq!(Scalar::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_filter_value_from_values() {
        assert_eq!(FilterValue::from_values(vec![]), None);
        assert_eq!(
            FilterValue::from_values(vec![Scalar::Int(4)]),
            Some(FilterValue::One(Scalar::Int(4)))
        );
        assert_eq!(
            FilterValue::from_values(vec![Scalar::Int(4), Scalar::Int(7)]),
            Some(FilterValue::Many(vec![Scalar::Int(4), Scalar::Int(7)]))
        );
    }
}
