//! In-memory typed values: what callers encode from and decode into.
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    None,
    Ellipsis,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Decimal(Decimal),
    Str(String),

    List(Vec<Value>),
    Deque(VecDeque<Value>),
    Set(IndexSet<Value>),
    FrozenSet(IndexSet<Value>),
    Tuple(Vec<Value>),

    Dict(IndexMap<Value, Value>),
    OrderedDict(IndexMap<Value, Value>),

    Record(Record),
    Enum(EnumValue),
}

/// Record instance; field order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub enum_name: String,
    pub member: String,
}

impl Value {
    pub fn float(f: f64) -> Self { Value::Float(OrderedFloat(f)) }
    pub fn str(s: impl Into<String>) -> Self { Value::Str(s.into()) }
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self { Value::Tuple(items.into_iter().collect()) }
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self { Value::List(items.into_iter().collect()) }
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self { Value::Set(items.into_iter().collect()) }
    pub fn frozen_set(items: impl IntoIterator<Item = Value>) -> Self { Value::FrozenSet(items.into_iter().collect()) }
    pub fn dict(entries: impl IntoIterator<Item = (Value, Value)>) -> Self { Value::Dict(entries.into_iter().collect()) }
    pub fn ordered_dict(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::OrderedDict(entries.into_iter().collect())
    }
    pub fn enum_member(enum_name: impl Into<String>, member: impl Into<String>) -> Self {
        Value::Enum(EnumValue { enum_name: enum_name.into(), member: member.into() })
    }

    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Ellipsis => "ellipsis",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "Decimal",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Deque(_) => "deque",
            Value::Set(_) => "set",
            Value::FrozenSet(_) => "frozenset",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::OrderedDict(_) => "OrderedDict",
            Value::Record(_) => "record",
            Value::Enum(_) => "enum",
        }
    }
}

impl Record {
    pub fn new<N: Into<String>>(name: impl Into<String>, fields: impl IntoIterator<Item = (N, Value)>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }
}

// Sets and dicts compare without regard to order, so they hash by size only.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None | Value::Ellipsis => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(xs) | Value::Tuple(xs) => xs.hash(state),
            Value::Deque(xs) => xs.hash(state),
            Value::Set(xs) | Value::FrozenSet(xs) => xs.len().hash(state),
            Value::Dict(m) | Value::OrderedDict(m) => m.len().hash(state),
            Value::Record(r) => r.hash(state),
            Value::Enum(e) => e.hash(state),
        }
    }
}

// -------------------------------- Display --------------------------------- //

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Ellipsis => f.write_str("Ellipsis"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{:?}", x.0),
            Value::Decimal(d) => write!(f, "Decimal('{d}')"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::List(xs) => write_seq(f, "[", xs.iter(), "]"),
            Value::Deque(xs) => write_seq(f, "deque([", xs.iter(), "])"),
            Value::Set(xs) => write_seq(f, "{", xs.iter(), "}"),
            Value::FrozenSet(xs) => write_seq(f, "frozenset({", xs.iter(), "})"),
            Value::Tuple(xs) if xs.len() == 1 => write!(f, "({},)", xs[0]),
            Value::Tuple(xs) => write_seq(f, "(", xs.iter(), ")"),
            Value::Dict(m) => write_map(f, "{", m, "}"),
            Value::OrderedDict(m) => write_map(f, "OrderedDict({", m, "})"),
            Value::Record(r) => {
                write!(f, "{}(", r.name)?;
                for (i, (name, v)) in r.fields.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{name}={v}")?;
                }
                f.write_str(")")
            }
            Value::Enum(e) => write!(f, "{}.{}", e.enum_name, e.member),
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, x) in items.enumerate() {
        if i > 0 { f.write_str(", ")?; }
        write!(f, "{x}")?;
    }
    f.write_str(close)
}

fn write_map(f: &mut fmt::Formatter<'_>, open: &str, m: &IndexMap<Value, Value>, close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, (k, v)) in m.iter().enumerate() {
        if i > 0 { f.write_str(", ")?; }
        write!(f, "{k}: {v}")?;
    }
    f.write_str(close)
}
