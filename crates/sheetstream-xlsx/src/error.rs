//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Broad classes of failure, for callers that only care about the category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The container or one of its parts is malformed
    Structural,
    /// A cell referenced a shared string that does not exist
    Lookup,
    /// A cell's content could not be interpreted as its declared type
    Value,
    /// The reader was driven in the wrong order
    Usage,
}

/// Errors that can occur while streaming an XLSX file
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Bytes at a record boundary were not a known ZIP signature
    #[error("invalid signature: 0x{0:x}")]
    InvalidSignature(u32),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Member compressed with a method other than stored or deflate
    #[error("Unsupported compression method {method} for '{name}'")]
    UnsupportedCompression {
        /// Member name
        name: String,
        /// ZIP compression method id
        method: u16,
    },

    /// Shared string index past the end of the table
    #[error("Shared string index {index} out of bounds ({len} strings)")]
    SharedStringIndex {
        /// Requested index
        index: usize,
        /// Table length
        len: usize,
    },

    /// Numeric cell whose text is not a number
    #[error("Invalid number '{raw}' in cell {reference}")]
    InvalidNumber {
        /// Cell reference, e.g. `B7`
        reference: String,
        /// The offending text
        raw: String,
    },

    /// Operation not allowed in the reader's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheetstream_core::Error),
}

impl XlsxError {
    /// The category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            XlsxError::Io(_)
            | XlsxError::Xml(_)
            | XlsxError::InvalidSignature(_)
            | XlsxError::InvalidFormat(_)
            | XlsxError::MissingPart(_)
            | XlsxError::UnsupportedCompression { .. } => ErrorKind::Structural,
            XlsxError::SharedStringIndex { .. } => ErrorKind::Lookup,
            XlsxError::InvalidNumber { .. } | XlsxError::Core(_) => ErrorKind::Value,
            XlsxError::InvalidState(_) => ErrorKind::Usage,
        }
    }
}
