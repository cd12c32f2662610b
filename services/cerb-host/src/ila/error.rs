//! ILA decode error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or decoding an ILA capture
#[derive(Debug, Error)]
pub enum IlaError {
    /// Header row 1 has no column containing "tdata"
    #[error("no data-bus column found (no header name contains \"tdata\"): {columns:?}")]
    NoDataColumn { columns: Vec<String> },

    /// Capture ended before both header rows were read
    #[error("missing header row {row}")]
    MissingHeader { row: usize },

    /// A data row does not match the expected hex-word layout
    #[error("line {line}, column {column}: {reason} (content: {content:?})")]
    Format {
        line: usize,
        column: usize,
        content: String,
        reason: FormatReason,
    },

    /// The capture could not be opened or read
    #[error("failed to read capture {}: {source}", display_path(.path))]
    Resource {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Decoder parameters are unusable
    #[error("invalid decoder configuration: {0}")]
    Config(String),
}

/// Why a data row was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatReason {
    #[error("row has no field at the data-bus column")]
    MissingField,

    #[error("hex length {len} is not a multiple of the {word_chars}-character word width")]
    PartialWord { len: usize, word_chars: usize },

    #[error("expected at least {expected} rail words, found {found}")]
    TooFewWords { expected: usize, found: usize },

    #[error("non-hexadecimal character {0:?}")]
    NonHex(char),
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<reader>".to_string(),
    }
}

impl IlaError {
    pub(crate) fn io(path: Option<PathBuf>, source: std::io::Error) -> Self {
        Self::Resource { path, source }
    }

    /// Attach the capture path to an I/O error raised while reading
    pub(crate) fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::Resource { path: None, source } => Self::Resource {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// Is this a capture-structure problem (as opposed to I/O or config)?
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::NoDataColumn { .. } | Self::MissingHeader { .. } | Self::Format { .. }
        )
    }
}
