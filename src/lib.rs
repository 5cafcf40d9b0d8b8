//! Typed JSON: encode host values to JSON and decode them back under a
//! runtime type descriptor.
//!
//! ```text
//! Value ──encode──▶ CanonicalValue ──text::write──▶ JSON text
//! Value ◀──decode── CanonicalValue ◀──text::read─── JSON text
//! ```
//!
//! Every descriptor is classified before use; the encoders refuse anything
//! that is not JSON encodable and report why.
pub mod canonical;
pub mod classify;
pub mod cli;
pub mod decode;
pub mod descriptor;
pub mod descriptor_file;
pub mod diagnostics;
pub mod encode;
pub mod error;
pub mod instance;
pub mod options;
pub mod text;
pub mod value;

pub use canonical::{CanonicalValue, DecimalText};
pub use classify::{is_checkable, is_hashable, is_json_encodable, is_keyable};
pub use decode::decode;
pub use descriptor::{EnumType, Field, LiteralValue, RecordType, TypeDescriptor, TypedDictField, TypedDictType};
pub use diagnostics::{DiagnosticLog, DiagnosticSink, Verdict};
pub use encode::encode;
pub use error::{Error, Result};
pub use instance::is_instance;
pub use options::Options;
pub use value::{EnumValue, Record, Value};

/// `encode` followed by compact JSON text.
pub fn dump_to_text(value: &Value, d: &TypeDescriptor, opts: &Options) -> Result<String> {
    text::write(&encode(value, d, opts)?)
}

/// JSON text read as canonical values, then `decode`.
pub fn load_from_text(src: &str, d: &TypeDescriptor, opts: &Options) -> Result<Value> {
    decode(&text::read(src)?, d, opts)
}
