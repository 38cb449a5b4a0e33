//! Error types for loading and validating simulation configuration.
//!
//! The tick itself never fails; these errors only surface at the edges where
//! tuning tables and world layouts are read from disk or resolved by name.

use std::{fmt, io, path::PathBuf};

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing a session.
#[derive(Debug)]
pub enum Error {
    /// Reading a file failed.
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// A JSON document could not be decoded.
    Parse {
        /// The file being decoded, or `<inline>` for string input.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// A preset name did not match any built-in table.
    UnknownPreset {
        /// The requested name.
        name: String,
    },
    /// A tuning value is outside its valid range.
    InvalidTuning {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Description of what was wrong.
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Error::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            Error::UnknownPreset { name } => {
                write!(f, "unknown tuning preset '{name}'")
            }
            Error::InvalidTuning { field, detail } => {
                write!(f, "invalid tuning value {field}: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
