//! Map-key policy shared by the encoder and decoder.
use crate::descriptor::TypeDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The encoded scalar's natural string form is the map key.
    Direct,
    /// The encoded value is written as JSON text, and that text is the map key.
    Stringified,
}

pub fn key_strategy(key: &TypeDescriptor) -> KeyStrategy {
    match key {
        TypeDescriptor::Bool
        | TypeDescriptor::Int
        | TypeDescriptor::Float
        | TypeDescriptor::Str
        | TypeDescriptor::NoneType
        | TypeDescriptor::Literal(_)
        | TypeDescriptor::Enum(_) => KeyStrategy::Direct,
        _ => KeyStrategy::Stringified,
    }
}
