//! Value types that slots may hold.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tagged variant over the dynamic types an [`ExtensionValue`] can carry.
///
/// Carries its own string form so it round-trips through the TSV cell
/// representation without losing its declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ExtensionValue {
    /// `true`/`false`
    Boolean(bool),
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Double(f64),
    /// Free text
    String(String),
    /// Civil date (time component, if any, is dropped)
    Date(NaiveDate),
    /// Date and time
    DateTime(chrono::NaiveDateTime),
    /// An entity-reference IRI
    Identifier(String),
    /// A URI-typed value (not shortenable to a CURIE)
    Uri(String),
    /// Anything that does not fit the above, kept verbatim
    Other(String),
}

impl ExtensionValue {
    /// Render the value back to its string form, as stored in a TSV cell.
    #[must_use]
    pub fn to_cell_string(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Double(d) => d.to_string(),
            Self::String(s) | Self::Identifier(s) | Self::Uri(s) | Self::Other(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Parse a raw string into an `ExtensionValue` of the given type hint.
    ///
    /// # Errors
    /// Returns an error message when the string does not parse as the
    /// hinted type.
    pub fn parse(raw: &str, hint: ExtensionTypeHint) -> Result<Self, String> {
        match hint {
            ExtensionTypeHint::Boolean => raw
                .parse::<bool>()
                .map(Self::Boolean)
                .map_err(|e| e.to_string()),
            ExtensionTypeHint::Integer => raw
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|e| e.to_string()),
            ExtensionTypeHint::Double => raw
                .parse::<f64>()
                .map(Self::Double)
                .map_err(|e| e.to_string()),
            ExtensionTypeHint::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Self::Date)
                .map_err(|e| e.to_string()),
            ExtensionTypeHint::DateTime => {
                chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                    .map(Self::DateTime)
                    .or_else(|_| {
                        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                            .map(|d| Self::Date(d))
                    })
                    .map_err(|e| e.to_string())
            }
            ExtensionTypeHint::Identifier => Ok(Self::Identifier(raw.to_string())),
            ExtensionTypeHint::Uri => url::Url::parse(raw)
                .map(|_| Self::Uri(raw.to_string()))
                .map_err(|e| e.to_string()),
            ExtensionTypeHint::String => Ok(Self::String(raw.to_string())),
            ExtensionTypeHint::Other => Ok(Self::Other(raw.to_string())),
        }
    }
}

impl fmt::Display for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell_string())
    }
}

/// Type hint recorded on an [`crate::model::extension::ExtensionDefinition`],
/// used to parse raw cell text into a typed [`ExtensionValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionTypeHint {
    /// `xsd:boolean`
    Boolean,
    /// `xsd:integer`
    Integer,
    /// `xsd:double`
    Double,
    /// `xsd:string`
    String,
    /// `xsd:date`
    Date,
    /// `xsd:dateTime`
    DateTime,
    /// An entity-reference IRI
    Identifier,
    /// `xsd:anyURI`
    Uri,
    /// Unrecognised type IRI, kept as opaque text
    Other,
}

/// Mapping cardinality, `subject:object` shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// `1:1`
    OneToOne,
    /// `1:n`
    OneToMany,
    /// `n:1`
    ManyToOne,
    /// `n:n`
    ManyToMany,
}

impl Cardinality {
    /// Parse the `1:1`/`1:n`/`n:1`/`n:n` wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1:1" => Some(Self::OneToOne),
            "1:n" => Some(Self::OneToMany),
            "n:1" => Some(Self::ManyToOne),
            "n:n" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// Render back to the wire form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:n",
            Self::ManyToOne => "n:1",
            Self::ManyToMany => "n:n",
        }
    }

    /// The inverse cardinality under subject/object swap (§4.G).
    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            Self::OneToOne => Self::OneToOne,
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToOne => Self::OneToMany,
            Self::ManyToMany => Self::ManyToMany,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `predicate_modifier` — currently only the SSSOM `Not` negation modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateModifier {
    /// Negates the predicate (the mapping asserts the predicate does *not* hold).
    Not,
}

impl PredicateModifier {
    /// Parse the wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("not") {
            Some(Self::Not)
        } else {
            None
        }
    }

    /// Render back to the wire form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Not => "Not",
        }
    }
}

/// A closed, per-variant view of any slot's value, used by the generic
/// visitor dispatch in [`crate::model::registry`].
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// A single string (including entity references and URIs, both stored
    /// as full IRIs at rest).
    Str(String),
    /// An unordered-semantically, deterministically-serialised string list.
    StrList(Vec<String>),
    /// A bounded-range double (confidence, similarity score).
    Double(f64),
    /// A civil date.
    Date(NaiveDate),
    /// An enum-valued slot, stored by its wire-form string.
    Enum(String),
    /// A free-form string-to-string map.
    Map(IndexMap<String, String>),
    /// The extension-definition list on a mapping set.
    ExtensionDefs(Vec<crate::model::extension::ExtensionDefinition>),
    /// The property-IRI-keyed extension value map on a mapping or set.
    ExtensionMap(IndexMap<String, ExtensionValue>),
}

impl SlotValue {
    /// Whether this value is considered "empty" for filter/propagation
    /// purposes (empty string, empty list, empty map).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) | Self::Enum(s) => s.is_empty(),
            Self::StrList(v) => v.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::ExtensionDefs(v) => v.is_empty(),
            Self::ExtensionMap(m) => m.is_empty(),
            Self::Double(_) | Self::Date(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_uri() {
        let v = ExtensionValue::parse("https://example.org/x", ExtensionTypeHint::Uri).unwrap();
        assert_eq!(v, ExtensionValue::Uri("https://example.org/x".to_string()));
    }

    #[test]
    fn rejects_a_malformed_uri() {
        assert!(ExtensionValue::parse("not a uri", ExtensionTypeHint::Uri).is_err());
    }

    #[test]
    fn round_trips_cell_string_for_plain_types() {
        let v = ExtensionValue::parse("42", ExtensionTypeHint::Integer).unwrap();
        assert_eq!(v.to_cell_string(), "42");
    }
}
