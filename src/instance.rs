//! Structural instance checks: does a value conform to a descriptor?
//!
//! - `bool` is never an `int` or a `float`, even though both are integral.
//! - `int` values satisfy `float`; decimals satisfy either only when the
//!   caller's `cast_decimal` option is on.
//! - Literals match by kind and value, so `Literal[1]` rejects `True` and `1.0`.
//! - Unions try their branches in declared order and stop at the first match.
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;

use crate::classify;
use crate::descriptor::{EnumType, LiteralValue, RecordType, TypeDescriptor, TypedDictType};
use crate::diagnostics::{DiagnosticLog, Verdict};
use crate::error::Result;
use crate::options::Options;
use crate::value::Value;

/// Checks `value` against `d`.
///
/// Fails with a classification error when `d` is not checkable: that is a
/// precondition, not a negative answer.
pub fn is_instance(value: &Value, d: &TypeDescriptor, opts: &Options) -> Result<Verdict> {
    classify::ensure_checkable(d)?;
    let mut log = DiagnosticLog::new();
    let holds = conforms(value, d, opts, &mut log);
    Ok(Verdict::new(holds, log))
}

/// Recursive check; `d` must already be known to be checkable.
pub(crate) fn conforms(value: &Value, d: &TypeDescriptor, opts: &Options, log: &mut DiagnosticLog) -> bool {
    use TypeDescriptor as T;
    let ok = match d {
        T::Any => true,
        T::Bool => matches!(value, Value::Bool(_)),
        T::Int => match value {
            Value::Int(_) => true,
            Value::Decimal(x) => opts.cast_decimal && x.fract().is_zero() && x.to_i64().is_some(),
            _ => false,
        },
        T::Float => match value {
            Value::Int(_) | Value::Float(_) => true,
            Value::Decimal(_) => opts.cast_decimal,
            _ => false,
        },
        T::Str => matches!(value, Value::Str(_)),
        T::NoneType => matches!(value, Value::None),
        T::Ellipsis => matches!(value, Value::Ellipsis),
        T::Decimal => matches!(value, Value::Decimal(_)),

        T::List(e) => match value {
            Value::List(xs) => every(xs, e, opts, log),
            _ => false,
        },
        T::Deque(e) => match value {
            Value::Deque(xs) => every(xs, e, opts, log),
            _ => false,
        },
        T::Set(e) => match value {
            Value::Set(xs) => every(xs, e, opts, log),
            _ => false,
        },
        T::FrozenSet(e) => match value {
            Value::FrozenSet(xs) => every(xs, e, opts, log),
            _ => false,
        },
        T::TupleUniform(e) => match value {
            Value::Tuple(xs) => every(xs, e, opts, log),
            _ => false,
        },
        T::TupleFixed(elems) => match value {
            Value::Tuple(xs) if xs.len() == elems.len() => xs
                .iter()
                .zip(elems)
                .fold(true, |acc, (x, e)| conforms(x, e, opts, log) && acc),
            Value::Tuple(xs) => {
                log.push(format!("Tuple {value} has {} members, expected {}.", xs.len(), elems.len()));
                false
            }
            _ => false,
        },

        T::Dict { key, value: val } => match value {
            Value::Dict(m) | Value::OrderedDict(m) => entries(m, key, val, opts, log),
            _ => false,
        },
        T::OrderedMap { key, value: val } => match value {
            Value::OrderedDict(m) => entries(m, key, val, opts, log),
            _ => false,
        },
        T::Mapping { key, value: val } => match value {
            Value::Dict(m) | Value::OrderedDict(m) => entries(m, key, val, opts, log),
            _ => false,
        },

        T::Optional(_) | T::Union(_) => {
            let branches = d.union_branches().unwrap_or_default();
            return any_branch(value, d, &branches, opts, log);
        }
        T::Literal(values) => values.iter().any(|lit| literal_matches(lit, value)),

        T::Record(r) => record(value, r, opts, log),
        T::Enum(e) => enum_member(value, e),
        T::TypedDict(t) => typed_dict(value, t, opts, log),
    };
    if !ok {
        log.push(format!("Value {value} is not an instance of {d}."));
    }
    ok
}

fn every<'a>(
    items: impl IntoIterator<Item = &'a Value>,
    elem: &TypeDescriptor,
    opts: &Options,
    log: &mut DiagnosticLog,
) -> bool {
    items.into_iter().fold(true, |acc, x| conforms(x, elem, opts, log) && acc)
}

fn entries(
    m: &IndexMap<Value, Value>,
    key: &TypeDescriptor,
    val: &TypeDescriptor,
    opts: &Options,
    log: &mut DiagnosticLog,
) -> bool {
    m.iter().fold(true, |acc, (k, v)| {
        let k_ok = conforms(k, key, opts, log);
        conforms(v, val, opts, log) && k_ok && acc
    })
}

fn any_branch(
    value: &Value,
    d: &TypeDescriptor,
    branches: &[&TypeDescriptor],
    opts: &Options,
    log: &mut DiagnosticLog,
) -> bool {
    let mut failures = DiagnosticLog::new();
    for branch in branches {
        let mut scratch = DiagnosticLog::new();
        if conforms(value, branch, opts, &mut scratch) {
            tracing::trace!(union = %d, branch = %branch, "value matched union branch");
            return true;
        }
        failures.append(scratch);
    }
    log.append(failures);
    log.push(format!("Value {value} is not an instance of {d}."));
    false
}

pub(crate) fn literal_matches(lit: &LiteralValue, value: &Value) -> bool {
    match (lit, value) {
        (LiteralValue::Bool(a), Value::Bool(b)) => a == b,
        (LiteralValue::Int(a), Value::Int(b)) => a == b,
        (LiteralValue::Float(a), Value::Float(b)) => a == b,
        (LiteralValue::Str(a), Value::Str(b)) => a == b,
        (LiteralValue::None, Value::None) => true,
        _ => false,
    }
}

fn record(value: &Value, r: &RecordType, opts: &Options, log: &mut DiagnosticLog) -> bool {
    let Value::Record(rec) = value else { return false };
    let same_shape = rec.fields.len() == r.fields.len()
        && rec.fields.iter().zip(&r.fields).all(|((name, _), f)| *name == f.name);
    if !same_shape {
        log.push(format!("Record {value} does not have the fields of {}.", r.name));
        return false;
    }
    rec.fields
        .iter()
        .zip(&r.fields)
        .fold(true, |acc, ((_, v), f)| conforms(v, &f.descriptor, opts, log) && acc)
}

fn enum_member(value: &Value, e: &EnumType) -> bool {
    match value {
        Value::Enum(ev) => ev.enum_name == e.name && e.member(&ev.member).is_some(),
        _ => false,
    }
}

fn typed_dict(value: &Value, t: &TypedDictType, opts: &Options, log: &mut DiagnosticLog) -> bool {
    let (Value::Dict(m) | Value::OrderedDict(m)) = value else { return false };
    let mut ok = true;
    for (k, v) in m {
        let Value::Str(name) = k else {
            log.push(format!("Key {k} of typed dict {} is not a string.", t.name));
            ok = false;
            continue;
        };
        match t.field(name) {
            Some(f) => ok = conforms(v, &f.descriptor, opts, log) && ok,
            None => {
                log.push(format!("Unexpected key '{name}' for typed dict {}.", t.name));
                ok = false;
            }
        }
    }
    for f in t.fields.iter().filter(|f| f.required) {
        if !m.contains_key(&Value::Str(f.name.clone())) {
            log.push(format!("Missing required key '{}' for typed dict {}.", f.name, t.name));
            ok = false;
        }
    }
    ok
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Field, TypedDictField};
    use crate::error::Error;
    use crate::value::Record;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use TypeDescriptor as T;

    fn check(value: &Value, d: &T) -> bool {
        is_instance(value, d, &Options::default().with_cast_decimal(false)).unwrap().holds()
    }

    fn dec(s: &str) -> Value { Value::Decimal(Decimal::from_str(s).unwrap()) }

    #[test]
    fn booleans_are_not_numbers() {
        assert!(!check(&Value::Bool(true), &T::Int));
        assert!(!check(&Value::Bool(true), &T::Float));
        assert!(check(&Value::Int(1), &T::Float));
        assert!(!check(&Value::float(1.0), &T::Int));
        assert!(check(&Value::Bool(false), &T::Bool));
        assert!(!check(&Value::Int(0), &T::Bool));
    }

    #[test]
    fn decimals_need_the_cast_flag() {
        let cast = Options::default();
        let strict = cast.with_cast_decimal(false);
        for s in ["1.0", "1"] {
            assert!(is_instance(&dec(s), &T::Int, &cast).unwrap().holds());
            assert!(!is_instance(&dec(s), &T::Int, &strict).unwrap().holds());
        }
        assert!(!is_instance(&dec("1.1"), &T::Int, &cast).unwrap().holds());
        assert!(is_instance(&dec("1.1"), &T::Float, &cast).unwrap().holds());
        assert!(!is_instance(&dec("1.1"), &T::Float, &strict).unwrap().holds());
        assert!(is_instance(&dec("1.1"), &T::Decimal, &strict).unwrap().holds());
    }

    #[test]
    fn containers_check_kind_and_members() {
        let xs = Value::list([Value::Int(1), Value::Int(2)]);
        assert!(check(&xs, &T::list(T::Int)));
        assert!(!check(&xs, &T::set(T::Int)));
        assert!(!check(&xs, &T::tuple_uniform(T::Int)));
        assert!(!check(&Value::list([Value::Int(1), Value::str("x")]), &T::list(T::Int)));

        let pair = Value::tuple([Value::Int(1), Value::str("a")]);
        assert!(check(&pair, &T::tuple_fixed([T::Int, T::Str])));
        assert!(!check(&pair, &T::tuple_fixed([T::Str, T::Int])));
        assert!(!check(&pair, &T::tuple_fixed([T::Int, T::Str, T::Str])));
        assert!(!check(&pair, &T::tuple_uniform(T::Int)));

        let fs = Value::frozen_set([Value::Int(1), Value::Int(3)]);
        assert!(check(&fs, &T::frozen_set(T::Int)));
        assert!(!check(&fs, &T::set(T::Int)));
    }

    #[test]
    fn mappings_check_keys_and_values() {
        let d = Value::dict([(Value::str("a"), Value::Int(1))]);
        assert!(check(&d, &T::dict(T::Str, T::Int)));
        assert!(check(&d, &T::mapping(T::Str, T::Int)));
        assert!(!check(&d, &T::ordered_map(T::Str, T::Int)));
        assert!(!check(&d, &T::dict(T::Int, T::Int)));
        let od = Value::ordered_dict([(Value::str("a"), Value::Int(1))]);
        assert!(check(&od, &T::ordered_map(T::Str, T::Int)));
        assert!(check(&od, &T::dict(T::Str, T::Int)));
    }

    #[test]
    fn union_failure_collects_every_branch() {
        let d = T::union([T::Int, T::Str]);
        let v = is_instance(&Value::float(1.5), &d, &Options::default()).unwrap();
        assert!(!v.holds());
        assert_eq!(v.diagnostics().reasons(), [
            "Value 1.5 is not an instance of int.",
            "Value 1.5 is not an instance of str.",
            "Value 1.5 is not an instance of Union[int, str].",
        ]);
        let ok = is_instance(&Value::str("x"), &d, &Options::default()).unwrap();
        assert!(ok.holds());
        assert!(ok.diagnostics().is_empty());
        assert!(check(&Value::None, &T::optional(T::Int)));
    }

    #[test]
    fn literals_compare_by_kind() {
        let d = T::literal([LiteralValue::Int(1), LiteralValue::from("a")]);
        assert!(check(&Value::Int(1), &d));
        assert!(check(&Value::str("a"), &d));
        assert!(!check(&Value::Bool(true), &d));
        assert!(!check(&Value::float(1.0), &d));
    }

    #[test]
    fn records_enums_and_typed_dicts() {
        let person = T::Record(RecordType::new("Person", [
            Field::required("name", T::Str),
            Field::with_default("id", T::Int, Value::Int(3)),
        ]));
        let gill = Value::Record(Record::new("Person", [("name", Value::str("Gill")), ("id", Value::Int(2))]));
        assert!(check(&gill, &person));
        let swapped = Value::Record(Record::new("Person", [("id", Value::Int(2)), ("name", Value::str("Gill"))]));
        assert!(!check(&swapped, &person));
        assert!(!check(&Value::tuple([Value::str("Gill"), Value::Int(2)]), &person));

        let color = T::Enum(EnumType::new("Color", [("Red", LiteralValue::Int(0)), ("Blue", LiteralValue::Int(2))]));
        assert!(check(&Value::enum_member("Color", "Red"), &color));
        assert!(!check(&Value::enum_member("Color", "Yellow"), &color));
        assert!(!check(&Value::enum_member("Shade", "Red"), &color));

        let td = T::TypedDict(TypedDictType::new("A", [
            TypedDictField::new("name", T::list(T::Str), true),
            TypedDictField::new("value", T::union([T::Int, T::Float]), false),
        ]));
        let a = Value::dict([
            (Value::str("name"), Value::list([Value::str("hi")])),
            (Value::str("value"), Value::float(1.1)),
        ]);
        assert!(check(&a, &td));
        assert!(check(&Value::dict([(Value::str("name"), Value::list([]))]), &td));
        assert!(!check(&Value::dict([(Value::str("value"), Value::Int(0))]), &td));
        assert!(!check(&Value::dict([(Value::str("name"), Value::Int(0))]), &td));
    }

    #[test]
    fn uncheckable_descriptor_is_an_error() {
        let err = is_instance(&Value::Int(1), &T::union([T::Int]), &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Classification { .. }));
    }
}
