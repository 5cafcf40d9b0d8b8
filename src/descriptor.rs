//! Type descriptors: the closed set of type shapes the engines understand.
//!
//! A descriptor is a finite, read-only tree. Every engine matches on it
//! exhaustively, so adding a variant means touching classification,
//! instance-checking, encoding and decoding together.
use std::fmt;
use ordered_float::OrderedFloat;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Bool,
    Int,
    Float,
    Str,
    NoneType,
    Ellipsis,
    Any,
    Decimal,

    List(Box<TypeDescriptor>),
    Deque(Box<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    FrozenSet(Box<TypeDescriptor>),
    TupleUniform(Box<TypeDescriptor>),      // Tuple[T, ...]
    TupleFixed(Vec<TypeDescriptor>),        // Tuple[T1, .., Tn], exact arity

    Dict { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },
    OrderedMap { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },
    Mapping { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },

    Optional(Box<TypeDescriptor>),          // sugar for Union[T, None]
    Union(Vec<TypeDescriptor>),             // ordered; first match wins
    Literal(Vec<LiteralValue>),

    Record(RecordType),
    Enum(EnumType),
    TypedDict(TypedDictType),
}

/// A primitive literal, compared by kind and value (never by coercion).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    None,
}

/// Named-tuple analogue: ordered fields, optional per-field defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: LiteralValue,
}

/// String-keyed dictionary with a fixed set of declared keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDictType {
    pub name: String,
    pub fields: Vec<TypedDictField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedDictField {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub required: bool,
}

pub(crate) static NONE_TYPE: TypeDescriptor = TypeDescriptor::NoneType;

// ------------------------------ Constructors ------------------------------ //

impl TypeDescriptor {
    pub fn list(elem: TypeDescriptor) -> Self { Self::List(Box::new(elem)) }
    pub fn deque(elem: TypeDescriptor) -> Self { Self::Deque(Box::new(elem)) }
    pub fn set(elem: TypeDescriptor) -> Self { Self::Set(Box::new(elem)) }
    pub fn frozen_set(elem: TypeDescriptor) -> Self { Self::FrozenSet(Box::new(elem)) }
    pub fn tuple_uniform(elem: TypeDescriptor) -> Self { Self::TupleUniform(Box::new(elem)) }
    pub fn tuple_fixed(elems: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::TupleFixed(elems.into_iter().collect())
    }
    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Dict { key: Box::new(key), value: Box::new(value) }
    }
    pub fn ordered_map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::OrderedMap { key: Box::new(key), value: Box::new(value) }
    }
    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Mapping { key: Box::new(key), value: Box::new(value) }
    }
    pub fn optional(inner: TypeDescriptor) -> Self { Self::Optional(Box::new(inner)) }
    pub fn union(members: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::Union(members.into_iter().collect())
    }
    pub fn literal(values: impl IntoIterator<Item = LiteralValue>) -> Self {
        Self::Literal(values.into_iter().collect())
    }

    /// Branches of a union-like descriptor, in declared order.
    ///
    /// `Optional(T)` yields `[T, NoneType]`; every other descriptor yields `None`.
    pub fn union_branches(&self) -> Option<Vec<&TypeDescriptor>> {
        match self {
            Self::Optional(inner) => Some(vec![inner.as_ref(), &NONE_TYPE]),
            Self::Union(members) => Some(members.iter().collect()),
            _ => None,
        }
    }

    /// Key and value descriptors of a mapping constructor.
    pub fn mapping_parts(&self) -> Option<(&TypeDescriptor, &TypeDescriptor)> {
        match self {
            Self::Dict { key, value }
            | Self::OrderedMap { key, value }
            | Self::Mapping { key, value } => Some((key.as_ref(), value.as_ref())),
            _ => None,
        }
    }
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self { name: name.into(), fields: fields.into_iter().collect() }
    }
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Field {
    pub fn required(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self { name: name.into(), descriptor, default: None }
    }
    pub fn with_default(name: impl Into<String>, descriptor: TypeDescriptor, default: Value) -> Self {
        Self { name: name.into(), descriptor, default: Some(default) }
    }
}

impl EnumType {
    pub fn new<N, I>(name: impl Into<String>, members: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, LiteralValue)>,
    {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(n, value)| EnumMember { name: n.into(), value })
                .collect(),
        }
    }
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

impl TypedDictType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = TypedDictField>) -> Self {
        Self { name: name.into(), fields: fields.into_iter().collect() }
    }
    pub fn field(&self, name: &str) -> Option<&TypedDictField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl TypedDictField {
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor, required: bool) -> Self {
        Self { name: name.into(), descriptor, required }
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self { Self::Bool(b) }
}
impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self { Self::Int(i) }
}
impl From<f64> for LiteralValue {
    fn from(f: f64) -> Self { Self::Float(OrderedFloat(f)) }
}
impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self { Self::Str(s.to_string()) }
}

// -------------------------------- Display --------------------------------- //

// Typing-annotation names: `List[int]`, `Optional[str]`, `Tuple[int, ...]`.

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::NoneType => f.write_str("None"),
            Self::Ellipsis => f.write_str("..."),
            Self::Any => f.write_str("Any"),
            Self::Decimal => f.write_str("Decimal"),
            Self::List(e) => write!(f, "List[{e}]"),
            Self::Deque(e) => write!(f, "Deque[{e}]"),
            Self::Set(e) => write!(f, "Set[{e}]"),
            Self::FrozenSet(e) => write!(f, "FrozenSet[{e}]"),
            Self::TupleUniform(e) => write!(f, "Tuple[{e}, ...]"),
            Self::TupleFixed(elems) => {
                f.write_str("Tuple[")?;
                write_joined(f, elems)?;
                f.write_str("]")
            }
            Self::Dict { key, value } => write!(f, "Dict[{key}, {value}]"),
            Self::OrderedMap { key, value } => write!(f, "OrderedDict[{key}, {value}]"),
            Self::Mapping { key, value } => write!(f, "Mapping[{key}, {value}]"),
            Self::Optional(inner) => write!(f, "Optional[{inner}]"),
            Self::Union(members) => {
                f.write_str("Union[")?;
                write_joined(f, members)?;
                f.write_str("]")
            }
            Self::Literal(values) => {
                f.write_str("Literal[")?;
                write_joined(f, values)?;
                f.write_str("]")
            }
            Self::Record(r) => f.write_str(&r.name),
            Self::Enum(e) => f.write_str(&e.name),
            Self::TypedDict(t) => f.write_str(&t.name),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{:?}", x.0),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::None => f.write_str("None"),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 { f.write_str(", ")?; }
        write!(f, "{item}")?;
    }
    Ok(())
}
