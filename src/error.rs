use thiserror::Error;

use crate::CompileError;
use crate::parse::ParseError;

/// Unified error type covering parsing, compilation, JSON decoding and I/O.
///
/// Returned by convenience loaders like [`RuleSet::from_dsl()`](crate::RuleSet::from_dsl),
/// [`RuleSet::from_json()`](crate::RuleSet::from_json) and
/// [`RuleSet::from_file()`](crate::RuleSet::from_file).
#[derive(Debug, Error)]
pub enum TermguardError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("invalid rule definitions: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
