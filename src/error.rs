use thiserror::Error;

use crate::diagnostics::DiagnosticLog;

/// Failures surfaced by the public entry points.
///
/// Reason lists are ordered innermost-first.
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor is not checkable/hashable/encodable as the operation needs.
    #[error("classification failure: {}", .reasons.join("; "))]
    Classification { reasons: Vec<String> },

    /// A value (or canonical value) does not match a descriptor.
    #[error("conformance failure: {}", .reasons.join("; "))]
    Conformance { reasons: Vec<String> },

    /// Malformed JSON text at the codec boundary.
    #[error("json text error: {0}")]
    Text(#[from] serde_json::Error),

    /// Malformed descriptor document.
    #[error("descriptor error: {0}")]
    Descriptor(String),
}

impl Error {
    pub(crate) fn classification(log: DiagnosticLog) -> Self {
        Error::Classification { reasons: log.into_reasons() }
    }

    pub(crate) fn conformance(log: DiagnosticLog) -> Self {
        Error::Conformance { reasons: log.into_reasons() }
    }

    /// Innermost-first reasons, when the failure carries any.
    pub fn reasons(&self) -> &[String] {
        match self {
            Error::Classification { reasons } | Error::Conformance { reasons } => reasons,
            Error::Text(_) | Error::Descriptor(_) => &[],
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
