//! Decode: canonical value + descriptor → typed value.
//!
//! Failures log innermost-first: a member that does not decode logs its own
//! line before the container that holds it.
mod numeric;

use indexmap::IndexMap;

use crate::canonical::CanonicalValue;
use crate::classify::{self, KeyStrategy};
use crate::descriptor::{EnumType, LiteralValue, RecordType, TypeDescriptor, TypedDictType};
use crate::diagnostics::DiagnosticLog;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::text;
use crate::value::{Record, Value};

use numeric::found;

/// Decodes `cv` as an instance of `d`.
///
/// `d` must be JSON encodable; a shape that cannot satisfy `d` is a
/// conformance error carrying every reason collected on the way.
pub fn decode(cv: &CanonicalValue, d: &TypeDescriptor, opts: &Options) -> Result<Value> {
    classify::ensure_json_encodable(d)?;
    let mut log = DiagnosticLog::new();
    decode_value(cv, d, opts, &mut log).ok_or_else(|| Error::conformance(log))
}

fn decode_value(cv: &CanonicalValue, d: &TypeDescriptor, opts: &Options, log: &mut DiagnosticLog) -> Option<Value> {
    use CanonicalValue as C;
    use TypeDescriptor as T;
    let step: Result<Value, String> = match d {
        T::Any => Err("any cannot be decoded".to_string()),
        T::Bool => match cv {
            C::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(found(other)),
        },
        T::Int => numeric::int(cv, opts).map(Value::Int),
        T::Float => numeric::float(cv, opts).map(Value::float),
        T::Decimal => numeric::decimal(cv).map(Value::Decimal),
        T::Str => match cv {
            C::Str(s) => Ok(Value::Str(s.clone())),
            other => Err(found(other)),
        },
        T::NoneType => null(cv, Value::None),
        T::Ellipsis => null(cv, Value::Ellipsis),

        T::List(e) => members(cv, e, opts, log).map(Value::List),
        T::Deque(e) => members(cv, e, opts, log).map(|xs| Value::Deque(xs.into())),
        T::Set(e) => members(cv, e, opts, log).map(Value::set),
        T::FrozenSet(e) => members(cv, e, opts, log).map(Value::frozen_set),
        T::TupleUniform(e) => members(cv, e, opts, log).map(Value::Tuple),
        T::TupleFixed(elems) => fixed(cv, elems, opts, log),

        T::Dict { key, value } | T::Mapping { key, value } => entries(cv, key, value, opts, log).map(Value::Dict),
        T::OrderedMap { key, value } => entries(cv, key, value, opts, log).map(Value::OrderedDict),

        T::Optional(_) | T::Union(_) => {
            let branches = d.union_branches().unwrap_or_default();
            return first_branch(cv, d, &branches, opts, log);
        }
        T::Literal(values) => literal(cv, values),
        T::Record(r) => record(cv, r, opts, log),
        T::Enum(e) => enum_member(cv, e),
        T::TypedDict(t) => typed_dict(cv, t, opts, log),
    };
    match step {
        Ok(v) => Some(v),
        Err(why) => {
            log.push(format!("Cannot decode {cv} as {d}: {why}."));
            None
        }
    }
}

fn null(cv: &CanonicalValue, v: Value) -> Result<Value, String> {
    match cv {
        CanonicalValue::Null => Ok(v),
        other => Err(found(other)),
    }
}

fn members(cv: &CanonicalValue, elem: &TypeDescriptor, opts: &Options, log: &mut DiagnosticLog) -> Result<Vec<Value>, String> {
    let CanonicalValue::List(xs) = cv else { return Err(found(cv)) };
    let mut out = Vec::with_capacity(xs.len());
    let mut failed = 0;
    for x in xs {
        match decode_value(x, elem, opts, log) {
            Some(v) => out.push(v),
            None => failed += 1,
        }
    }
    if failed == 0 { Ok(out) } else { Err(format!("{failed} of {} members do not decode", xs.len())) }
}

fn fixed(cv: &CanonicalValue, elems: &[TypeDescriptor], opts: &Options, log: &mut DiagnosticLog) -> Result<Value, String> {
    let CanonicalValue::List(xs) = cv else { return Err(found(cv)) };
    if xs.len() != elems.len() {
        return Err(format!("found {} members, expected {}", xs.len(), elems.len()));
    }
    let mut out = Vec::with_capacity(xs.len());
    let mut failed = Vec::new();
    for (i, (x, e)) in xs.iter().zip(elems).enumerate() {
        match decode_value(x, e, opts, log) {
            Some(v) => out.push(v),
            None => failed.push(i.to_string()),
        }
    }
    if failed.is_empty() { Ok(Value::Tuple(out)) } else { Err(format!("members {} do not decode", failed.join(", "))) }
}

fn entries(
    cv: &CanonicalValue,
    key: &TypeDescriptor,
    val: &TypeDescriptor,
    opts: &Options,
    log: &mut DiagnosticLog,
) -> Result<IndexMap<Value, Value>, String> {
    let CanonicalValue::Map(m) = cv else { return Err(found(cv)) };
    let mut out = IndexMap::with_capacity(m.len());
    let mut failed = Vec::new();
    for (k_text, v) in m {
        let k = decode_key(k_text, key, opts, log);
        let v = decode_value(v, val, opts, log);
        match (k, v) {
            (Some(k), Some(v)) => {
                if out.contains_key(&k) {
                    return Err(format!("keys collide on {k}"));
                }
                out.insert(k, v);
            }
            _ => failed.push(format!("'{k_text}'")),
        }
    }
    if failed.is_empty() { Ok(out) } else { Err(format!("entries {} do not decode", failed.join(", "))) }
}

/// Reverses the key policy: direct keys are read back from their scalar
/// text, stringified keys are parsed as JSON text first.
fn decode_key(k_text: &str, key: &TypeDescriptor, opts: &Options, log: &mut DiagnosticLog) -> Option<Value> {
    match classify::key_strategy(key) {
        KeyStrategy::Direct => {
            let as_str = CanonicalValue::Str(k_text.to_string());
            let mut candidates = Vec::with_capacity(2);
            if !matches!(key, TypeDescriptor::Str | TypeDescriptor::Enum(_)) {
                if let Ok(parsed) = text::read(k_text) {
                    if parsed.scalar_key_text().is_some() {
                        candidates.push(parsed);
                    }
                }
            }
            candidates.push(as_str);
            let mut failures = DiagnosticLog::new();
            for c in &candidates {
                let mut scratch = DiagnosticLog::new();
                if let Some(v) = decode_value(c, key, opts, &mut scratch) {
                    return Some(v);
                }
                if failures.is_empty() {
                    failures = scratch;
                }
            }
            log.append(failures);
            None
        }
        KeyStrategy::Stringified => match text::read(k_text) {
            Ok(parsed) => {
                tracing::trace!(key = k_text, descriptor = %key, "reading stringified map key");
                decode_value(&parsed, key, opts, log)
            }
            Err(err) => {
                log.push(format!("Cannot decode key '{k_text}' as {key}: {err}."));
                None
            }
        },
    }
}

fn first_branch(
    cv: &CanonicalValue,
    d: &TypeDescriptor,
    branches: &[&TypeDescriptor],
    opts: &Options,
    log: &mut DiagnosticLog,
) -> Option<Value> {
    let mut failures = DiagnosticLog::new();
    for branch in branches {
        let mut scratch = DiagnosticLog::new();
        if let Some(v) = decode_value(cv, branch, opts, &mut scratch) {
            tracing::debug!(union = %d, branch = %branch, "decoded through union branch");
            return Some(v);
        }
        failures.append(scratch);
    }
    log.append(failures);
    log.push(format!("Cannot decode {cv} as {d}: no member of the union matches."));
    None
}

fn literal(cv: &CanonicalValue, values: &[LiteralValue]) -> Result<Value, String> {
    use CanonicalValue as C;
    values
        .iter()
        .find_map(|lit| match (lit, cv) {
            (LiteralValue::Bool(a), C::Bool(b)) if a == b => Some(Value::Bool(*a)),
            (LiteralValue::Int(a), C::IntNumber(b)) if a == b => Some(Value::Int(*a)),
            (LiteralValue::Float(a), C::DecimalNumber(t)) if t.to_f64() == Some(a.0) => Some(Value::Float(*a)),
            (LiteralValue::Str(a), C::Str(b)) if a == b => Some(Value::Str(a.clone())),
            (LiteralValue::None, C::Null) => Some(Value::None),
            _ => None,
        })
        .ok_or_else(|| "not one of the literal values".to_string())
}

fn record(cv: &CanonicalValue, r: &RecordType, opts: &Options, log: &mut DiagnosticLog) -> Result<Value, String> {
    let mut problems = Vec::new();
    let mut fields = Vec::with_capacity(r.fields.len());
    match cv {
        CanonicalValue::Map(m) => {
            for k in m.keys().filter(|k| r.field(k).is_none()) {
                problems.push(format!("unexpected field '{k}'"));
            }
            for f in &r.fields {
                match (m.get(&f.name), &f.default) {
                    (Some(x), _) => match decode_value(x, &f.descriptor, opts, log) {
                        Some(v) => fields.push((f.name.clone(), v)),
                        None => problems.push(format!("field '{}' does not decode", f.name)),
                    },
                    (None, Some(default)) => fields.push((f.name.clone(), default.clone())),
                    (None, None) => problems.push(format!("missing field '{}'", f.name)),
                }
            }
        }
        CanonicalValue::List(xs) => {
            let least = r.fields.iter().rposition(|f| f.default.is_none()).map_or(0, |i| i + 1);
            if xs.len() < least || xs.len() > r.fields.len() {
                return Err(format!("found {} members, expected {least} to {}", xs.len(), r.fields.len()));
            }
            for (i, f) in r.fields.iter().enumerate() {
                match (xs.get(i), &f.default) {
                    (Some(x), _) => match decode_value(x, &f.descriptor, opts, log) {
                        Some(v) => fields.push((f.name.clone(), v)),
                        None => problems.push(format!("field '{}' does not decode", f.name)),
                    },
                    (None, Some(default)) => fields.push((f.name.clone(), default.clone())),
                    (None, None) => problems.push(format!("missing field '{}'", f.name)),
                }
            }
        }
        other => return Err(found(other)),
    }
    if problems.is_empty() {
        Ok(Value::Record(Record::new(r.name.as_str(), fields)))
    } else {
        Err(problems.join(", "))
    }
}

fn enum_member(cv: &CanonicalValue, e: &EnumType) -> Result<Value, String> {
    match cv {
        CanonicalValue::Str(s) if e.member(s).is_some() => Ok(Value::enum_member(e.name.as_str(), s.as_str())),
        CanonicalValue::Str(s) => Err(format!("'{s}' is not a member of {}", e.name)),
        other => Err(found(other)),
    }
}

fn typed_dict(cv: &CanonicalValue, t: &TypedDictType, opts: &Options, log: &mut DiagnosticLog) -> Result<Value, String> {
    let CanonicalValue::Map(m) = cv else { return Err(found(cv)) };
    let mut problems = Vec::new();
    let mut out = IndexMap::with_capacity(m.len());
    for (k, x) in m {
        let Some(f) = t.field(k) else {
            problems.push(format!("unexpected key '{k}'"));
            continue;
        };
        match decode_value(x, &f.descriptor, opts, log) {
            Some(v) => { out.insert(Value::Str(k.clone()), v); }
            None => problems.push(format!("key '{k}' does not decode")),
        }
    }
    for f in t.fields.iter().filter(|f| f.required && !m.contains_key(&f.name)) {
        problems.push(format!("missing required key '{}'", f.name));
    }
    if problems.is_empty() { Ok(Value::Dict(out)) } else { Err(problems.join(", ")) }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Field, TypedDictField};
    use crate::encode::encode;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use TypeDescriptor as T;

    fn load(src: &str, d: &T) -> Result<Value> {
        decode(&text::read(src)?, d, &Options::default())
    }

    fn person() -> T {
        T::Record(RecordType::new("Person", [
            Field::required("name", T::Str),
            Field::with_default("id", T::Int, Value::Int(3)),
        ]))
    }

    #[test]
    fn scalars() {
        assert_eq!(load("true", &T::Bool).unwrap(), Value::Bool(true));
        assert_eq!(load("1", &T::Int).unwrap(), Value::Int(1));
        assert_eq!(load("1", &T::Float).unwrap(), Value::float(1.0));
        assert_eq!(load("\"hi\"", &T::Str).unwrap(), Value::str("hi"));
        assert_eq!(load("null", &T::NoneType).unwrap(), Value::None);
        assert_eq!(load("null", &T::Ellipsis).unwrap(), Value::Ellipsis);
        assert!(load("1", &T::Bool).is_err());
        assert!(load("true", &T::Int).is_err());
    }

    #[test]
    fn decimal_policy() {
        let on = Options::default();
        let off = Options::default().with_cast_decimal(false);
        let one = text::read("1.0").unwrap();
        let one_and_a_half = text::read("1.5").unwrap();
        assert_eq!(decode(&one, &T::Int, &on).unwrap(), Value::Int(1));
        assert!(decode(&one_and_a_half, &T::Int, &on).is_err());
        assert!(decode(&one, &T::Int, &off).is_err());
        assert!(decode(&one_and_a_half, &T::Int, &off).is_err());

        let err = decode(&one_and_a_half, &T::Int, &on).unwrap_err();
        assert_eq!(err.reasons(), ["Cannot decode 1.5 as int: 1.5 has a non-zero fractional part."]);
    }

    #[test]
    fn digits_beyond_decimal_precision_are_errors() {
        let err = load("\"0.12345678901234567890123456789012345\"", &T::Decimal).unwrap_err();
        assert_eq!(err.reasons(), [
            "Cannot decode \"0.12345678901234567890123456789012345\" as Decimal: \
             0.12345678901234567890123456789012345 cannot be held exactly as a decimal.",
        ]);
        assert!(load("0.12345678901234567890123456789012345", &T::Decimal).is_err());
        assert!(load("1.00000000000000000000000000001", &T::Int).is_err());

        let err = load("123456789012345678901234567890", &T::Int).unwrap_err();
        assert!(err.reasons()[0].contains("out of range for a 64-bit integer"), "{err}");
    }

    #[test]
    fn decimals_round_trip_exactly() {
        let x = Value::Decimal(Decimal::from_str("0.1000000000000000000001").unwrap());
        for opts in [Options::default(), Options::default().with_decimals_as_numbers(true)] {
            let cv = encode(&x, &T::Decimal, &opts).unwrap();
            let back = decode(&text::read(&text::write(&cv).unwrap()).unwrap(), &T::Decimal, &opts).unwrap();
            assert_eq!(back, x);
        }
    }

    #[test]
    fn containers() {
        let ints = || [Value::Int(1), Value::Int(2), Value::Int(1)];
        assert_eq!(load("[1,2,1]", &T::list(T::Int)).unwrap(), Value::list(ints()));
        assert_eq!(load("[1,2,1]", &T::deque(T::Int)).unwrap(), Value::Deque(ints().into_iter().collect()));
        assert_eq!(load("[1,2,1]", &T::set(T::Int)).unwrap(), Value::set([Value::Int(1), Value::Int(2)]));
        assert_eq!(load("[1,2,1]", &T::tuple_uniform(T::Int)).unwrap(), Value::tuple(ints()));
        assert!(load("[1,2]", &T::tuple_fixed([T::Int, T::Int, T::Int])).is_err());
        assert_eq!(
            load("[1,\"a\"]", &T::tuple_fixed([T::Int, T::Str])).unwrap(),
            Value::tuple([Value::Int(1), Value::str("a")]),
        );
    }

    #[test]
    fn member_failures_come_first() {
        let err = load("[1,\"x\"]", &T::list(T::Int)).unwrap_err();
        assert_eq!(err.reasons(), [
            "Cannot decode \"x\" as int: found string.",
            "Cannot decode [1,\"x\"] as List[int]: 1 of 2 members do not decode.",
        ]);
    }

    #[test]
    fn mappings_and_keys() {
        let d = T::dict(T::Int, T::Str);
        assert_eq!(load(r#"{"1":"a"}"#, &d).unwrap(), Value::dict([(Value::Int(1), Value::str("a"))]));
        assert!(load(r#"{"x":"a"}"#, &d).is_err());

        let pairs = T::ordered_map(T::tuple_fixed([T::Int, T::Int]), T::Str);
        assert_eq!(
            load(r#"{"[0,1]":"x"}"#, &pairs).unwrap(),
            Value::ordered_dict([(Value::tuple([Value::Int(0), Value::Int(1)]), Value::str("x"))]),
        );

        let by_lit = T::dict(T::literal(["1".into(), LiteralValue::Int(2)]), T::Bool);
        assert_eq!(
            load(r#"{"1":true,"2":false}"#, &by_lit).unwrap(),
            Value::dict([(Value::str("1"), Value::Bool(true)), (Value::Int(2), Value::Bool(false))]),
        );
    }

    #[test]
    fn record_defaults() {
        let gill = Value::Record(Record::new("Person", [("name", Value::str("Gill")), ("id", Value::Int(2))]));
        let john = Value::Record(Record::new("Person", [("name", Value::str("John")), ("id", Value::Int(3))]));
        assert_eq!(load(r#"{"name":"Gill","id":2}"#, &person()).unwrap(), gill);
        assert_eq!(load(r#"{"name":"John"}"#, &person()).unwrap(), john);
        assert_eq!(load(r#"["John"]"#, &person()).unwrap(), john);

        let err = load(r#"{"id":2}"#, &person()).unwrap_err();
        assert_eq!(err.reasons(), [r#"Cannot decode {"id":2} as Person: missing field 'name'."#]);
        let err = load(r#"{"name":"Gill","age":2}"#, &person()).unwrap_err();
        assert!(err.reasons()[0].contains("unexpected field 'age'"));
        assert!(load("[]", &person()).is_err());
        assert!(load(r#"["a",1,2]"#, &person()).is_err());
    }

    #[test]
    fn enums_and_typed_dicts() {
        let color = T::Enum(EnumType::new("EnumT", [("Red", LiteralValue::Int(0)), ("Green", LiteralValue::Int(1))]));
        assert_eq!(load("\"Green\"", &color).unwrap(), Value::enum_member("EnumT", "Green"));
        assert!(load("\"Blue\"", &color).is_err());
        assert!(load("0", &color).is_err());

        let td = T::TypedDict(TypedDictType::new("Movie", [
            TypedDictField::new("title", T::Str, true),
            TypedDictField::new("year", T::Int, false),
        ]));
        assert_eq!(
            load(r#"{"title":"Up"}"#, &td).unwrap(),
            Value::dict([(Value::str("title"), Value::str("Up"))]),
        );
        assert!(load(r#"{"year":2009}"#, &td).unwrap_err().reasons()[0].contains("missing required key 'title'"));
        assert!(load(r#"{"title":"Up","cast":[]}"#, &td).unwrap_err().reasons()[0].contains("unexpected key 'cast'"));
    }

    #[test]
    fn unions_take_the_first_matching_branch() {
        let d = T::union([T::tuple_fixed([T::Int, T::Int]), T::frozen_set(T::Int)]);
        let t = Value::tuple([Value::Int(1), Value::Int(3)]);
        let s = Value::frozen_set([Value::Int(1), Value::Int(3)]);
        let opts = Options::default();
        assert_eq!(encode(&t, &d, &opts).unwrap(), encode(&s, &d, &opts).unwrap());
        assert_eq!(load("[1,3]", &d).unwrap(), t);

        assert_eq!(load("null", &T::optional(T::Int)).unwrap(), Value::None);
        assert_eq!(load("4", &T::optional(T::Int)).unwrap(), Value::Int(4));

        let err = load("\"x\"", &T::optional(T::Int)).unwrap_err();
        assert_eq!(err.reasons(), [
            "Cannot decode \"x\" as int: found string.",
            "Cannot decode \"x\" as None: found string.",
            "Cannot decode \"x\" as Optional[int]: no member of the union matches.",
        ]);
    }

    #[test]
    fn literals() {
        let d = T::literal(["a".into(), LiteralValue::Int(1), LiteralValue::from(2.5), LiteralValue::None]);
        assert_eq!(load("\"a\"", &d).unwrap(), Value::str("a"));
        assert_eq!(load("1", &d).unwrap(), Value::Int(1));
        assert_eq!(load("2.5", &d).unwrap(), Value::float(2.5));
        assert_eq!(load("null", &d).unwrap(), Value::None);
        assert!(load("\"b\"", &d).is_err());
        assert!(load("1.0", &d).is_err());
    }

    #[test]
    fn non_encodable_descriptors_are_rejected() {
        let err = load("1", &T::Any).unwrap_err();
        assert!(matches!(err, Error::Classification { .. }));
    }
}
