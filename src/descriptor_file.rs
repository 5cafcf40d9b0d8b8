//! Descriptor documents: JSON files that spell out a `TypeDescriptor`.
//!
//! ```json
//! {"type": "dict", "key": {"type": "str"}, "value": {"type": "list", "of": {"type": "int"}}}
//! ```
//!
//! Parsing goes through a serde DTO (`DescriptorDoc`), which is then adapted
//! to the descriptor tree. Record defaults are plain JSON decoded under their
//! field's descriptor.
use serde::Deserialize;

use crate::decode::decode;
use crate::descriptor::{EnumType, Field, LiteralValue, RecordType, TypeDescriptor, TypedDictField, TypedDictType};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::text;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DescriptorDoc {
    Bool,
    Int,
    Float,
    Str,
    None,
    Ellipsis,
    Any,
    Decimal,
    List { of: Box<DescriptorDoc> },
    Deque { of: Box<DescriptorDoc> },
    Set { of: Box<DescriptorDoc> },
    FrozenSet { of: Box<DescriptorDoc> },
    /// `Tuple[T, ...]`
    Tuple { of: Box<DescriptorDoc> },
    TupleFixed { items: Vec<DescriptorDoc> },
    Dict { key: Box<DescriptorDoc>, value: Box<DescriptorDoc> },
    OrderedDict { key: Box<DescriptorDoc>, value: Box<DescriptorDoc> },
    Mapping { key: Box<DescriptorDoc>, value: Box<DescriptorDoc> },
    Optional { of: Box<DescriptorDoc> },
    Union { members: Vec<DescriptorDoc> },
    Literal { values: Vec<serde_json::Value> },
    Record { name: String, fields: Vec<FieldDoc> },
    Enum { name: String, members: Vec<MemberDoc> },
    TypedDict { name: String, fields: Vec<TypedDictFieldDoc> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DescriptorDoc,
    /// Present-but-null means a `None` default, not "no default".
    #[serde(default, deserialize_with = "present")]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberDoc {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypedDictFieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DescriptorDoc,
    #[serde(default = "required_by_default")]
    pub required: bool,
}

fn required_by_default() -> bool { true }

fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Parse a descriptor document, reporting the JSON path of any error.
pub fn from_str(src: &str) -> Result<TypeDescriptor> {
    let deserializer = &mut serde_json::Deserializer::from_str(src);
    let doc: DescriptorDoc = serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        Error::Descriptor(format!("at JSON path {path} → {}", err.into_inner()))
    })?;
    doc.to_descriptor()
}

// --------------------------- adapter: Doc -> TypeDescriptor --------------------------- //

impl DescriptorDoc {
    pub fn to_descriptor(&self) -> Result<TypeDescriptor> {
        use DescriptorDoc as D;
        use TypeDescriptor as T;
        Ok(match self {
            D::Bool => T::Bool,
            D::Int => T::Int,
            D::Float => T::Float,
            D::Str => T::Str,
            D::None => T::NoneType,
            D::Ellipsis => T::Ellipsis,
            D::Any => T::Any,
            D::Decimal => T::Decimal,
            D::List { of } => T::list(of.to_descriptor()?),
            D::Deque { of } => T::deque(of.to_descriptor()?),
            D::Set { of } => T::set(of.to_descriptor()?),
            D::FrozenSet { of } => T::frozen_set(of.to_descriptor()?),
            D::Tuple { of } => T::tuple_uniform(of.to_descriptor()?),
            D::TupleFixed { items } => T::TupleFixed(all(items)?),
            D::Dict { key, value } => T::dict(key.to_descriptor()?, value.to_descriptor()?),
            D::OrderedDict { key, value } => T::ordered_map(key.to_descriptor()?, value.to_descriptor()?),
            D::Mapping { key, value } => T::mapping(key.to_descriptor()?, value.to_descriptor()?),
            D::Optional { of } => T::optional(of.to_descriptor()?),
            D::Union { members } => T::Union(all(members)?),
            D::Literal { values } => T::Literal(values.iter().map(literal).collect::<Result<_>>()?),
            D::Record { name, fields } => {
                let fields = fields
                    .iter()
                    .map(|f| {
                        let descriptor = f.ty.to_descriptor()?;
                        match &f.default {
                            None => Ok(Field::required(f.name.as_str(), descriptor)),
                            Some(json) => {
                                let default = record_default(name, &f.name, json, &descriptor)?;
                                Ok(Field::with_default(f.name.as_str(), descriptor, default))
                            }
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                T::Record(RecordType::new(name.as_str(), fields))
            }
            D::Enum { name, members } => {
                let members = members
                    .iter()
                    .map(|m| Ok((m.name.as_str(), literal(&m.value)?)))
                    .collect::<Result<Vec<_>>>()?;
                T::Enum(EnumType::new(name.as_str(), members))
            }
            D::TypedDict { name, fields } => {
                let fields = fields
                    .iter()
                    .map(|f| Ok(TypedDictField::new(f.name.as_str(), f.ty.to_descriptor()?, f.required)))
                    .collect::<Result<Vec<_>>>()?;
                T::TypedDict(TypedDictType::new(name.as_str(), fields))
            }
        })
    }
}

fn all(docs: &[DescriptorDoc]) -> Result<Vec<TypeDescriptor>> {
    docs.iter().map(DescriptorDoc::to_descriptor).collect()
}

fn literal(json: &serde_json::Value) -> Result<LiteralValue> {
    use serde_json::Value as J;
    match json {
        J::Null => Ok(LiteralValue::None),
        J::Bool(b) => Ok(LiteralValue::Bool(*b)),
        J::String(s) => Ok(LiteralValue::Str(s.clone())),
        J::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(LiteralValue::Int(i)),
            (None, Some(x)) if x.is_finite() => Ok(LiteralValue::from(x)),
            _ => Err(Error::Descriptor(format!("literal number {n} is out of range"))),
        },
        other => Err(Error::Descriptor(format!("literal values must be JSON scalars, found {other}"))),
    }
}

fn record_default(record: &str, field: &str, json: &serde_json::Value, d: &TypeDescriptor) -> Result<crate::value::Value> {
    let cv = text::from_json(json.clone())?;
    decode(&cv, d, &Options::default()).map_err(|err| {
        Error::Descriptor(format!("default for field '{field}' of record {record}: {err}"))
    })
}
