//! Error types for the netlist front end.
//!
//! Syntax faults are never reported through this type: the parser encodes
//! them in the tree (see [`crate::syntax::ErrorReason`]). [`NetlistError`]
//! covers what can fail around a parse: reading files, selecting a
//! configuration, and the CLI's final verdict.

use thiserror::Error;

/// Result type alias using [`NetlistError`].
pub type Result<T> = std::result::Result<T, NetlistError>;

/// Unified error type for all netlist front-end operations.
#[derive(Error, Debug)]
pub enum NetlistError {
    // ============ I/O Errors ============
    /// Error reading a netlist file
    #[error("Failed to read netlist file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Netlist file is not valid UTF-8
    #[error("Netlist file '{path}' is not valid UTF-8 (first bad byte at offset {offset})")]
    InvalidEncoding { path: String, offset: usize },

    /// Source larger than the 4 GiB the span model can address
    #[error("Netlist '{path}' is {len} bytes; sources over 4 GiB are not supported")]
    SourceTooLarge { path: String, len: usize },

    // ============ Configuration Errors ============
    /// Unknown dialect name
    #[error("Unknown dialect '{name}' (expected one of: generic, ngspice, hspice, ltspice, pspice, xyce, spectre)")]
    UnknownDialect { name: String },

    // ============ Parse Outcome ============
    /// The parse finished but recorded syntax errors
    #[error("{path}: {count} syntax error(s)")]
    SyntaxErrors { path: String, count: usize },
}

impl NetlistError {
    /// Create a file read error
    pub fn file_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a syntax-errors verdict
    pub fn syntax_errors(path: impl Into<String>, count: usize) -> Self {
        Self::SyntaxErrors {
            path: path.into(),
            count,
        }
    }
}
