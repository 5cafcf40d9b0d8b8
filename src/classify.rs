//! Classification: which descriptors may be checked, hashed, used as keys
//! and encoded to JSON.
//!
//! Every judgment walks the whole tree rather than stopping at the first
//! failure, so the log carries every structural reason. A failing node logs
//! its children's reasons first, then its own `Type <d> is not ...` line.
pub mod keys;

use std::collections::HashSet;

use crate::descriptor::{LiteralValue, TypeDescriptor};
use crate::diagnostics::{DiagnosticLog, Verdict};
use crate::error::{Error, Result};
use crate::options::Options;

pub use keys::{key_strategy, KeyStrategy};

// ------------------------------- Front API -------------------------------- //

/// True when `is_instance` is guaranteed to work against `d`.
pub fn is_checkable(d: &TypeDescriptor) -> Verdict {
    let mut log = DiagnosticLog::new();
    let holds = checkable(d, &mut log);
    verdict("typecheckable", d, holds, log)
}

pub fn is_hashable(d: &TypeDescriptor) -> Verdict {
    let mut log = DiagnosticLog::new();
    let holds = checkable(d, &mut log) && hashable(d, &mut log);
    verdict("hashable", d, holds, log)
}

/// True when `d` may serve as the key descriptor of a mapping.
pub fn is_keyable(d: &TypeDescriptor) -> Verdict {
    let mut log = DiagnosticLog::new();
    let holds = checkable(d, &mut log) && keyable(d, &mut log);
    verdict("keyable", d, holds, log)
}

pub fn is_json_encodable(d: &TypeDescriptor) -> Verdict {
    let mut log = DiagnosticLog::new();
    let holds = if checkable(d, &mut log) {
        encodable(d, &mut log)
    } else {
        log.push(format!("Type {d} is not JSON encodable."));
        false
    };
    verdict("JSON encodable", d, holds, log)
}

/// Classification gate used by the encode/decode entry points.
pub(crate) fn ensure_json_encodable(d: &TypeDescriptor) -> Result<()> {
    let v = is_json_encodable(d);
    if v.holds() {
        Ok(())
    } else {
        Err(Error::classification(v.into_diagnostics()))
    }
}

pub(crate) fn ensure_checkable(d: &TypeDescriptor) -> Result<()> {
    let v = is_checkable(d);
    if v.holds() {
        Ok(())
    } else {
        Err(Error::classification(v.into_diagnostics()))
    }
}

fn verdict(judgment: &str, d: &TypeDescriptor, holds: bool, log: DiagnosticLog) -> Verdict {
    if !holds {
        tracing::debug!(descriptor = %d, reasons = log.len(), "type is not {judgment}");
    }
    Verdict::new(holds, log)
}

// ------------------------------- Checkable -------------------------------- //

pub(crate) fn checkable(d: &TypeDescriptor, log: &mut DiagnosticLog) -> bool {
    use TypeDescriptor as T;
    let ok = match d {
        T::Bool | T::Int | T::Float | T::Str | T::NoneType | T::Ellipsis | T::Any | T::Decimal => true,

        T::List(e) | T::Deque(e) | T::Set(e) | T::FrozenSet(e) | T::TupleUniform(e) => checkable(e, log),
        T::TupleFixed(elems) => all(elems, |e| checkable(e, log)),

        T::Dict { key, value } | T::OrderedMap { key, value } | T::Mapping { key, value } => {
            let k = checkable(key, log);
            checkable(value, log) && k
        }

        T::Optional(inner) => checkable(inner, log),
        T::Union(members) => {
            let arity = members.len() >= 2;
            if !arity {
                log.push(format!("Union type {d} must have at least two members."));
            }
            all(members, |m| checkable(m, log)) && arity
        }
        T::Literal(values) => {
            if values.is_empty() {
                log.push("Literal type must list at least one value.");
            }
            !values.is_empty()
        }

        T::Record(r) => {
            let unique = unique_names(r.fields.iter().map(|f| f.name.as_str()), "record", &r.name, log);
            let fields = all(&r.fields, |f| {
                if !checkable(&f.descriptor, log) {
                    return false;
                }
                match &f.default {
                    None => true,
                    Some(default) => {
                        let mut scratch = DiagnosticLog::new();
                        let ok = crate::instance::conforms(default, &f.descriptor, &Options::default().strict(), &mut scratch);
                        if !ok {
                            log.append(scratch);
                            log.push(format!(
                                "Default value {default} for field '{}' of record {} is not an instance of {}.",
                                f.name, r.name, f.descriptor
                            ));
                        }
                        ok
                    }
                }
            });
            unique && fields
        }
        T::Enum(e) => unique_names(e.members.iter().map(|m| m.name.as_str()), "enum", &e.name, log),
        T::TypedDict(t) => {
            let unique = unique_names(t.fields.iter().map(|f| f.name.as_str()), "typed dict", &t.name, log);
            all(&t.fields, |f| checkable(&f.descriptor, log)) && unique
        }
    };
    if !ok {
        log.push(format!("Type {d} is not typecheckable."));
    }
    ok
}

// -------------------------------- Hashable -------------------------------- //

pub(crate) fn hashable(d: &TypeDescriptor, log: &mut DiagnosticLog) -> bool {
    use TypeDescriptor as T;
    let ok = match d {
        T::Bool | T::Int | T::Float | T::Str | T::NoneType | T::Ellipsis | T::Decimal => true,
        T::Literal(_) | T::Enum(_) => true,
        T::Any => false,

        T::List(_) | T::Deque(_) | T::Set(_) => false,
        T::Dict { .. } | T::OrderedMap { .. } | T::Mapping { .. } | T::TypedDict(_) => false,

        T::FrozenSet(e) | T::TupleUniform(e) => hashable(e, log),
        T::TupleFixed(elems) => all(elems, |e| hashable(e, log)),
        T::Optional(inner) => hashable(inner, log),
        T::Union(members) => all(members, |m| hashable(m, log)),
        T::Record(r) => all(&r.fields, |f| hashable(&f.descriptor, log)),
    };
    if !ok {
        log.push(format!("Type {d} is not hashable."));
    }
    ok
}

/// A key descriptor must hash. Only the keyability verdict is logged; the
/// hashability trail that led to it stays out of the cascade.
pub(crate) fn keyable(d: &TypeDescriptor, log: &mut DiagnosticLog) -> bool {
    let mut scratch = DiagnosticLog::new();
    let ok = hashable(d, &mut scratch);
    if !ok {
        log.push(format!("Type {d} is not keyable."));
    }
    ok
}

// ------------------------------- Encodable -------------------------------- //

pub(crate) fn encodable(d: &TypeDescriptor, log: &mut DiagnosticLog) -> bool {
    use TypeDescriptor as T;
    let ok = match d {
        T::Bool | T::Int | T::Float | T::Str | T::NoneType | T::Ellipsis | T::Decimal => true,
        T::Any => false,

        T::List(e) | T::Deque(e) | T::Set(e) | T::FrozenSet(e) | T::TupleUniform(e) => encodable(e, log),
        T::TupleFixed(elems) => all(elems, |e| encodable(e, log)),

        T::Dict { key, value } | T::OrderedMap { key, value } | T::Mapping { key, value } => {
            let k = encodable(key, log) && keyable(key, log);
            encodable(value, log) && k
        }

        T::Optional(inner) => encodable(inner, log),
        T::Union(members) => all(members, |m| encodable(m, log)),
        T::Literal(values) => all(values, |v| match v {
            LiteralValue::Float(x) if !x.0.is_finite() => {
                log.push(format!("Literal value {v} is not JSON encodable."));
                false
            }
            _ => true,
        }),

        T::Record(r) => all(&r.fields, |f| encodable(&f.descriptor, log)),
        T::Enum(_) => true,
        T::TypedDict(t) => all(&t.fields, |f| encodable(&f.descriptor, log)),
    };
    if !ok {
        log.push(format!("Type {d} is not JSON encodable."));
    }
    ok
}

// ------------------------------- Utilities -------------------------------- //

/// Non-short-circuiting conjunction: every item is judged so every reason lands in the log.
fn all<'a, T: 'a>(items: impl IntoIterator<Item = &'a T>, mut judge: impl FnMut(&'a T) -> bool) -> bool {
    items.into_iter().fold(true, |acc, x| judge(x) && acc)
}

fn unique_names<'a>(
    names: impl Iterator<Item = &'a str>,
    what: &str,
    owner: &str,
    log: &mut DiagnosticLog,
) -> bool {
    let mut seen = HashSet::new();
    let mut ok = true;
    for n in names {
        if !seen.insert(n) {
            log.push(format!("Name '{n}' is repeated in {what} {owner}."));
            ok = false;
        }
    }
    ok
}

// ------------------------------- Tests ------------------------------------ //
