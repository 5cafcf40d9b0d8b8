// Canonical JSON-native values. No host types here.
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// The only shape Encode produces and Decode consumes.
///
/// Numbers are split: integers that fit `i64` are `IntNumber`, everything
/// else keeps its literal text in `DecimalNumber` so nothing is rounded
/// through a float on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    IntNumber(i64),
    DecimalNumber(DecimalText),
    Str(String),
    List(Vec<CanonicalValue>),
    Map(IndexMap<String, CanonicalValue>), // insertion order == key order
}

/// A JSON number literal with its digits as written: `1.10`, `-2.5e-3`, `123456789012345678901`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecimalText(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNumber(pub String);

impl fmt::Display for InvalidNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a JSON number literal", self.0)
    }
}

impl std::error::Error for InvalidNumber {}

impl DecimalText {
    pub fn as_str(&self) -> &str { &self.0 }

    /// Shortest round-tripping text for a finite float, always with a
    /// fraction or exponent so it never reads back as an integer.
    pub fn from_f64(x: f64) -> Option<Self> {
        if !x.is_finite() {
            return None;
        }
        let text = format!("{x:?}");
        let text = if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") };
        text.parse().ok()
    }

    pub fn from_decimal(d: &rust_decimal::Decimal) -> Self { Self(d.to_string()) }

    /// True when the literal carries a fraction or exponent.
    pub fn is_fractional_literal(&self) -> bool { self.0.contains(['.', 'e', 'E']) }

    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|x| x.is_finite())
    }
}

/// Accepts exactly the JSON number grammar. The stored text is the form
/// `serde_json` prints, which spells positive exponents with a sign (`1e+3`).
impl FromStr for DecimalText {
    type Err = InvalidNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str::<serde_json::Number>(s)
            .map(|n| Self(n.to_string()))
            .map_err(|_| InvalidNumber(s.to_string()))
    }
}

impl fmt::Display for DecimalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl CanonicalValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CanonicalValue::Null => "null",
            CanonicalValue::Bool(_) => "boolean",
            CanonicalValue::IntNumber(_) => "integer",
            CanonicalValue::DecimalNumber(_) => "decimal number",
            CanonicalValue::Str(_) => "string",
            CanonicalValue::List(_) => "list",
            CanonicalValue::Map(_) => "map",
        }
    }

    /// Natural string form of a scalar, as used for directly-keyable map keys.
    pub fn scalar_key_text(&self) -> Option<String> {
        match self {
            CanonicalValue::Null => Some("null".to_string()),
            CanonicalValue::Bool(b) => Some(b.to_string()),
            CanonicalValue::IntNumber(i) => Some(i.to_string()),
            CanonicalValue::DecimalNumber(d) => Some(d.to_string()),
            CanonicalValue::Str(s) => Some(s.clone()),
            CanonicalValue::List(_) | CanonicalValue::Map(_) => None,
        }
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CanonicalValue::Null => serializer.serialize_unit(),
            CanonicalValue::Bool(b) => serializer.serialize_bool(*b),
            CanonicalValue::IntNumber(i) => serializer.serialize_i64(*i),
            CanonicalValue::DecimalNumber(d) => {
                // arbitrary_precision keeps the literal text intact.
                let n: serde_json::Number = serde_json::from_str(d.as_str())
                    .map_err(serde::ser::Error::custom)?;
                n.serialize(serializer)
            }
            CanonicalValue::Str(s) => serializer.serialize_str(s),
            CanonicalValue::List(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs { seq.serialize_element(x)?; }
                seq.end()
            }
            CanonicalValue::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m { map.serialize_entry(k, v)?; }
                map.end()
            }
        }
    }
}

impl fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "<{}>", self.kind()),
        }
    }
}
