//! Encode: typed value + descriptor → canonical value.
//!
//! The recursion walks the descriptor and the value in lock-step, the same
//! way the instance check does. Unordered containers come out in their
//! current iteration order; nothing is sorted.
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;

use crate::canonical::{CanonicalValue, DecimalText};
use crate::classify::{self, KeyStrategy};
use crate::descriptor::{LiteralValue, RecordType, TypeDescriptor, TypedDictType};
use crate::diagnostics::DiagnosticLog;
use crate::error::{Error, Result};
use crate::instance;
use crate::options::Options;
use crate::text;
use crate::value::Value;

/// Encodes `value` as an instance of `d`.
///
/// `d` must be JSON encodable (classification error otherwise) and `value`
/// must be an instance of it (conformance error otherwise).
pub fn encode(value: &Value, d: &TypeDescriptor, opts: &Options) -> Result<CanonicalValue> {
    classify::ensure_json_encodable(d)?;
    let mut log = DiagnosticLog::new();
    if !instance::conforms(value, d, opts, &mut log) {
        return Err(Error::conformance(log));
    }
    encode_value(value, d, opts)
}

fn encode_value(value: &Value, d: &TypeDescriptor, opts: &Options) -> Result<CanonicalValue> {
    use TypeDescriptor as T;
    match d {
        T::Any => Err(mismatch(value, d)),
        T::Bool => match value {
            Value::Bool(b) => Ok(CanonicalValue::Bool(*b)),
            _ => Err(mismatch(value, d)),
        },
        T::Int => match value {
            Value::Int(i) => Ok(CanonicalValue::IntNumber(*i)),
            Value::Decimal(x) => x.to_i64().map(CanonicalValue::IntNumber).ok_or_else(|| mismatch(value, d)),
            _ => Err(mismatch(value, d)),
        },
        T::Float => match value {
            Value::Int(i) => Ok(CanonicalValue::IntNumber(*i)),
            Value::Float(x) => float_number(x.0),
            Value::Decimal(x) => Ok(CanonicalValue::DecimalNumber(DecimalText::from_decimal(x))),
            _ => Err(mismatch(value, d)),
        },
        T::Str => match value {
            Value::Str(s) => Ok(CanonicalValue::Str(s.clone())),
            _ => Err(mismatch(value, d)),
        },
        T::NoneType | T::Ellipsis => Ok(CanonicalValue::Null),
        T::Decimal => match value {
            Value::Decimal(x) if opts.decimals_as_numbers => {
                Ok(CanonicalValue::DecimalNumber(DecimalText::from_decimal(x)))
            }
            Value::Decimal(x) => Ok(CanonicalValue::Str(x.to_string())),
            _ => Err(mismatch(value, d)),
        },

        T::List(e) | T::Deque(e) | T::Set(e) | T::FrozenSet(e) | T::TupleUniform(e) => match value {
            Value::List(xs) | Value::Tuple(xs) => encode_all(xs, e, opts),
            Value::Deque(xs) => encode_all(xs, e, opts),
            Value::Set(xs) | Value::FrozenSet(xs) => encode_all(xs, e, opts),
            _ => Err(mismatch(value, d)),
        },
        T::TupleFixed(elems) => match value {
            Value::Tuple(xs) if xs.len() == elems.len() => xs
                .iter()
                .zip(elems)
                .map(|(x, e)| encode_value(x, e, opts))
                .collect::<Result<Vec<_>>>()
                .map(CanonicalValue::List),
            _ => Err(mismatch(value, d)),
        },

        T::Dict { key, value: val } | T::OrderedMap { key, value: val } | T::Mapping { key, value: val } => {
            match value {
                Value::Dict(m) | Value::OrderedDict(m) => encode_entries(m, key, val, opts),
                _ => Err(mismatch(value, d)),
            }
        }

        T::Optional(_) | T::Union(_) => {
            let branches = d.union_branches().unwrap_or_default();
            // Declared order decides; the first conforming branch encodes.
            for branch in &branches {
                if instance::conforms(value, branch, opts, &mut DiagnosticLog::new()) {
                    tracing::debug!(union = %d, branch = %branch, "encoding through union branch");
                    return encode_value(value, branch, opts);
                }
            }
            Err(mismatch(value, d))
        }
        T::Literal(values) => values
            .iter()
            .find(|lit| instance::literal_matches(lit, value))
            .map(literal_to_canonical)
            .ok_or_else(|| mismatch(value, d))?,

        T::Record(r) => encode_record(value, r, opts),
        T::Enum(e) => match value {
            Value::Enum(ev) if ev.enum_name == e.name => Ok(CanonicalValue::Str(ev.member.clone())),
            _ => Err(mismatch(value, d)),
        },
        T::TypedDict(t) => encode_typed_dict(value, t, opts),
    }
}

fn encode_all<'a>(
    items: impl IntoIterator<Item = &'a Value>,
    elem: &TypeDescriptor,
    opts: &Options,
) -> Result<CanonicalValue> {
    items
        .into_iter()
        .map(|x| encode_value(x, elem, opts))
        .collect::<Result<Vec<_>>>()
        .map(CanonicalValue::List)
}

fn encode_entries(
    m: &IndexMap<Value, Value>,
    key: &TypeDescriptor,
    val: &TypeDescriptor,
    opts: &Options,
) -> Result<CanonicalValue> {
    let mut out = IndexMap::with_capacity(m.len());
    for (k, v) in m {
        let k_text = key_text(k, key, opts)?;
        let encoded = encode_value(v, val, opts)?;
        if out.insert(k_text.clone(), encoded).is_some() {
            return Err(conformance(format!(
                "Keys of {} collide on the encoded key '{k_text}'.", Value::Dict(m.clone())
            )));
        }
    }
    Ok(CanonicalValue::Map(out))
}

/// Map-key text for `k`, per the key policy of its descriptor.
pub(crate) fn key_text(k: &Value, key: &TypeDescriptor, opts: &Options) -> Result<String> {
    let encoded = encode_value(k, key, opts)?;
    match classify::key_strategy(key) {
        KeyStrategy::Direct => encoded
            .scalar_key_text()
            .ok_or_else(|| conformance(format!("Key {k} does not encode to a scalar under {key}."))),
        KeyStrategy::Stringified => {
            let text = text::write(&encoded)?;
            tracing::trace!(key = %k, descriptor = %key, %text, "stringified map key");
            Ok(text)
        }
    }
}

fn encode_record(value: &Value, r: &RecordType, opts: &Options) -> Result<CanonicalValue> {
    let Value::Record(rec) = value else {
        return Err(mismatch(value, &TypeDescriptor::Record(r.clone())));
    };
    let encoded = rec
        .fields
        .iter()
        .zip(&r.fields)
        .map(|((name, v), f)| Ok((name.clone(), encode_value(v, &f.descriptor, opts)?)))
        .collect::<Result<Vec<_>>>()?;
    if opts.records_as_lists {
        Ok(CanonicalValue::List(encoded.into_iter().map(|(_, v)| v).collect()))
    } else {
        Ok(CanonicalValue::Map(encoded.into_iter().collect()))
    }
}

fn encode_typed_dict(value: &Value, t: &TypedDictType, opts: &Options) -> Result<CanonicalValue> {
    let (Value::Dict(m) | Value::OrderedDict(m)) = value else {
        return Err(mismatch(value, &TypeDescriptor::TypedDict(t.clone())));
    };
    let mut out = IndexMap::new();
    for f in &t.fields {
        if let Some(v) = m.get(&Value::Str(f.name.clone())) {
            out.insert(f.name.clone(), encode_value(v, &f.descriptor, opts)?);
        }
    }
    Ok(CanonicalValue::Map(out))
}

fn literal_to_canonical(lit: &LiteralValue) -> Result<CanonicalValue> {
    match lit {
        LiteralValue::Bool(b) => Ok(CanonicalValue::Bool(*b)),
        LiteralValue::Int(i) => Ok(CanonicalValue::IntNumber(*i)),
        LiteralValue::Float(x) => float_number(x.0),
        LiteralValue::Str(s) => Ok(CanonicalValue::Str(s.clone())),
        LiteralValue::None => Ok(CanonicalValue::Null),
    }
}

fn float_number(x: f64) -> Result<CanonicalValue> {
    DecimalText::from_f64(x)
        .map(CanonicalValue::DecimalNumber)
        .ok_or_else(|| conformance(format!("Float value {x} cannot be represented in JSON.")))
}

fn mismatch(value: &Value, d: &TypeDescriptor) -> Error {
    conformance(format!("Value {value} is not an instance of {d}."))
}

fn conformance(reason: String) -> Error {
    Error::Conformance { reasons: vec![reason] }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EnumType, Field, TypedDictField};
    use crate::value::Record;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    use TypeDescriptor as T;

    fn enc(value: &Value, d: &T) -> serde_json::Value {
        let cv = encode(value, d, &Options::default()).unwrap();
        serde_json::from_str(&text::write(&cv).unwrap()).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(enc(&Value::Bool(true), &T::Bool), json!(true));
        assert_eq!(enc(&Value::Int(1), &T::Int), json!(1));
        assert_eq!(enc(&Value::str("hello"), &T::Str), json!("hello"));
        assert_eq!(enc(&Value::None, &T::NoneType), json!(null));
        assert_eq!(enc(&Value::Ellipsis, &T::Ellipsis), json!(null));
        let cv = encode(&Value::float(1.5), &T::Float, &Options::default()).unwrap();
        assert_eq!(cv, CanonicalValue::DecimalNumber("1.5".parse().unwrap()));
    }

    #[test]
    fn decimals_are_strings_unless_asked() {
        let x = Value::Decimal(Decimal::from_str("1.0").unwrap());
        let cv = encode(&x, &T::Decimal, &Options::default()).unwrap();
        assert_eq!(cv, CanonicalValue::Str("1.0".into()));
        let cv = encode(&x, &T::Decimal, &Options::default().with_decimals_as_numbers(true)).unwrap();
        assert_eq!(cv, CanonicalValue::DecimalNumber("1.0".parse().unwrap()));
        let cv = encode(&x, &T::union([T::Bool, T::Str, T::Decimal]), &Options::default()).unwrap();
        assert_eq!(cv, CanonicalValue::Str("1.0".into()));
    }

    #[test]
    fn sequences_become_lists() {
        let ints = [Value::Int(0), Value::Int(1), Value::Int(2)];
        assert_eq!(enc(&Value::list(ints.clone()), &T::list(T::Int)), json!([0, 1, 2]));
        assert_eq!(enc(&Value::tuple(ints.clone()), &T::tuple_uniform(T::Int)), json!([0, 1, 2]));
        assert_eq!(enc(&Value::tuple(ints.clone()), &T::tuple_fixed([T::Int, T::Int, T::Int])), json!([0, 1, 2]));
        assert_eq!(enc(&Value::Deque(ints.clone().into_iter().collect()), &T::deque(T::Int)), json!([0, 1, 2]));
        assert_eq!(enc(&Value::set(ints.clone()), &T::set(T::Int)), json!([0, 1, 2]));
    }

    #[test]
    fn records_enums_typed_dicts() {
        let pair = T::Record(RecordType::new("Pair", [Field::required("left", T::Int), Field::required("right", T::Int)]));
        let p = Value::Record(Record::new("Pair", [("left", Value::Int(1)), ("right", Value::Int(2))]));
        assert_eq!(enc(&p, &pair), json!({"left": 1, "right": 2}));
        let cv = encode(&p, &pair, &Options::default().with_records_as_lists(true)).unwrap();
        assert_eq!(cv, CanonicalValue::List(vec![CanonicalValue::IntNumber(1), CanonicalValue::IntNumber(2)]));

        let color = T::Enum(EnumType::new("EnumT", [("Red", LiteralValue::Int(0)), ("Green", LiteralValue::Int(1))]));
        assert_eq!(enc(&Value::enum_member("EnumT", "Red"), &color), json!("Red"));
        let members = Value::list([Value::enum_member("EnumT", "Red"), Value::enum_member("EnumT", "Green")]);
        assert_eq!(enc(&members, &T::list(color)), json!(["Red", "Green"]));

        let td = T::TypedDict(TypedDictType::new("Opt", [
            TypedDictField::new("b", T::Int, false),
            TypedDictField::new("a", T::Str, true),
        ]));
        let v = Value::dict([(Value::str("a"), Value::str("x")), (Value::str("b"), Value::Int(1))]);
        let cv = encode(&v, &td, &Options::default()).unwrap();
        assert_eq!(text::write(&cv).unwrap(), r#"{"b":1,"a":"x"}"#);
    }

    #[test]
    fn map_keys_follow_the_key_policy() {
        let color = T::Enum(EnumType::new("EnumT", [("Red", LiteralValue::Int(0)), ("Blue", LiteralValue::Int(2))]));
        let by_enum = Value::dict([(Value::enum_member("EnumT", "Red"), Value::Int(0))]);
        assert_eq!(enc(&by_enum, &T::dict(color, T::Int)), json!({"Red": 0}));

        let by_int = Value::dict([(Value::Int(1), Value::Bool(true))]);
        assert_eq!(enc(&by_int, &T::dict(T::Int, T::Bool)), json!({"1": true}));

        let by_pair = Value::dict([(Value::tuple([Value::Int(0), Value::Int(1)]), Value::str("x"))]);
        let cv = encode(&by_pair, &T::dict(T::tuple_fixed([T::Int, T::Int]), T::Str), &Options::default()).unwrap();
        let CanonicalValue::Map(m) = cv else { panic!("expected a map") };
        assert_eq!(m.keys().collect::<Vec<_>>(), ["[0,1]"]);
    }

    #[test]
    fn union_uses_first_matching_branch() {
        let d = T::union([T::tuple_fixed([T::Int, T::Int]), T::frozen_set(T::Int)]);
        let t = Value::tuple([Value::Int(1), Value::Int(3)]);
        let s = Value::frozen_set([Value::Int(1), Value::Int(3)]);
        assert_eq!(enc(&t, &d), json!([1, 3]));
        assert_eq!(enc(&s, &d), json!([1, 3]));
    }

    #[test]
    fn union_branches_are_tried_in_declared_order() {
        let one = Value::Decimal(Decimal::from(1));
        let int_first = T::union([T::Int, T::Decimal]);
        let decimal_first = T::union([T::Decimal, T::Int]);
        let opts = Options::default();
        assert_eq!(encode(&one, &int_first, &opts).unwrap(), CanonicalValue::IntNumber(1));
        assert_eq!(encode(&one, &decimal_first, &opts).unwrap(), CanonicalValue::Str("1".into()));

        let no_cast = Options::default().with_cast_decimal(false);
        assert_eq!(encode(&one, &int_first, &no_cast).unwrap(), CanonicalValue::Str("1".into()));
    }

    #[test]
    fn rejects_bad_inputs() {
        let err = encode(&Value::Int(0), &T::Str, &Options::default()).unwrap_err();
        assert_eq!(err.reasons(), ["Value 0 is not an instance of str."]);
        let err = encode(&Value::Int(0), &T::Any, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Classification { .. }));
        let err = encode(&Value::float(f64::NAN), &T::Float, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Conformance { .. }));
    }
}
