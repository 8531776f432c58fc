//! Error types for netlist parsing and file handling

use std::path::PathBuf;

use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller
///
/// Analysis outcomes are not errors: a failed justification is an empty
/// vector, an empty clique list means no clique of the requested size,
/// and pruning is an informational flag on the clique result.
#[derive(Debug, Error)]
pub enum Error {
    /// File could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A statement matched none of the bench grammars
    #[error("line {line}: statement does not match the bench grammar: {text:?}")]
    MalformedLine {
        /// 1-based line number in the input
        line: usize,
        /// Offending statement, comments stripped
        text: String,
    },

    /// File extension is missing or not supported
    #[error("unsupported netlist file {0:?}: only .bench is handled")]
    UnsupportedExtension(PathBuf),
}
