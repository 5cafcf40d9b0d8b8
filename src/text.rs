//! JSON text ↔ canonical values.
//!
//! `serde_json` runs with `arbitrary_precision`, so number literals reach us
//! with every digit intact. Only the exponent spelling is normalized:
//! `1e3` reads back as `1e+3`.
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::canonical::{CanonicalValue, DecimalText};
use crate::error::Result;

pub fn write(cv: &CanonicalValue) -> Result<String> {
    Ok(serde_json::to_string(cv)?)
}

pub fn write_pretty(cv: &CanonicalValue) -> Result<String> {
    Ok(serde_json::to_string_pretty(cv)?)
}

/// Parse JSON text. Duplicate keys anywhere in the document are an error.
pub fn read(src: &str) -> Result<CanonicalValue> {
    reject_duplicate_keys(src)?;
    let json: serde_json::Value = serde_json::from_str(src)?;
    Ok(from_json(json)?)
}

// ----------------------------- Duplicate keys ----------------------------- //

fn reject_duplicate_keys(src: &str) -> Result<(), serde_json::Error> {
    let deserializer = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, UniqueKeys>(deserializer) {
        Ok(UniqueKeys) => Ok(()),
        Err(err) => {
            let path = err.path().to_string();
            Err(de::Error::custom(format!("at JSON path {path} → {}", err.into_inner())))
        }
    }
}

/// Walks a document only to check that no object repeats a key.
struct UniqueKeys;

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UniqueKeysVisitor)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = UniqueKeys;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<UniqueKeys, E> { Ok(UniqueKeys) }
    fn visit_i64<E: de::Error>(self, _: i64) -> Result<UniqueKeys, E> { Ok(UniqueKeys) }
    fn visit_u64<E: de::Error>(self, _: u64) -> Result<UniqueKeys, E> { Ok(UniqueKeys) }
    fn visit_f64<E: de::Error>(self, _: f64) -> Result<UniqueKeys, E> { Ok(UniqueKeys) }
    fn visit_str<E: de::Error>(self, _: &str) -> Result<UniqueKeys, E> { Ok(UniqueKeys) }
    fn visit_unit<E: de::Error>(self) -> Result<UniqueKeys, E> { Ok(UniqueKeys) }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<UniqueKeys, A::Error> {
        while seq.next_element::<UniqueKeys>()?.is_some() {}
        Ok(UniqueKeys)
    }

    // Numbers arrive here too under arbitrary_precision, as a one-entry map.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<UniqueKeys, A::Error> {
        let mut seen = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate key '{key}'")));
            }
            map.next_value::<UniqueKeys>()?;
        }
        Ok(UniqueKeys)
    }
}

// ------------------------------- Conversion ------------------------------- //

pub(crate) fn from_json(json: serde_json::Value) -> Result<CanonicalValue, serde_json::Error> {
    use serde_json::Value as J;
    Ok(match json {
        J::Null => CanonicalValue::Null,
        J::Bool(b) => CanonicalValue::Bool(b),
        J::Number(n) => number(&n.to_string())?,
        J::String(s) => CanonicalValue::Str(s),
        J::Array(xs) => CanonicalValue::List(xs.into_iter().map(from_json).collect::<Result<_, _>>()?),
        J::Object(m) => CanonicalValue::Map(
            m.into_iter()
                .map(|(k, v)| Ok((k, from_json(v)?)))
                .collect::<Result<IndexMap<_, _>, serde_json::Error>>()?,
        ),
    })
}

fn number(text: &str) -> Result<CanonicalValue, serde_json::Error> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(CanonicalValue::IntNumber(i));
        }
    }
    text.parse::<DecimalText>()
        .map(CanonicalValue::DecimalNumber)
        .map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_split_on_their_literal() {
        assert_eq!(read("1").unwrap(), CanonicalValue::IntNumber(1));
        assert_eq!(read("-7").unwrap(), CanonicalValue::IntNumber(-7));
        assert_eq!(read("1.0").unwrap(), CanonicalValue::DecimalNumber("1.0".parse().unwrap()));
        let thousand = read("1e3").unwrap();
        assert_eq!(thousand, CanonicalValue::DecimalNumber("1e3".parse().unwrap()));
        assert_eq!(write(&thousand).unwrap(), "1e+3");
        let big = "123456789012345678901234567890";
        assert_eq!(read(big).unwrap(), CanonicalValue::DecimalNumber(big.parse().unwrap()));
    }

    #[test]
    fn number_text_survives_a_round_trip() {
        let src = r#"{"z":0.10,"a":[1,2.50e-3,null,true,"s"]}"#;
        assert_eq!(write(&read(src).unwrap()).unwrap(), src);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = read(r#"{"a":1,"b":{"c":1,"c":2}}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("duplicate key 'c'"), "{msg}");
        assert!(msg.contains("b"), "{msg}");
        assert!(read(r#"[{"a":1},{"a":2}]"#).is_ok());
    }

    #[test]
    fn malformed_text_is_a_text_error() {
        assert!(matches!(read("{"), Err(crate::error::Error::Text(_))));
        assert!(matches!(read("[1,]"), Err(crate::error::Error::Text(_))));
        assert!(matches!(read("1 2"), Err(crate::error::Error::Text(_))));
    }

    #[test]
    fn pretty_output_indents() {
        let cv = read(r#"{"a":[1]}"#).unwrap();
        assert_eq!(write_pretty(&cv).unwrap(), "{\n  \"a\": [\n    1\n  ]\n}");
    }
}
