//! Error types for sheetstream-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetstream-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row number out of bounds (1-based)
    #[error("Row {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column number out of bounds (1-based)
    #[error("Column {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// Number format code that cannot be interpreted
    #[error("Invalid number format: {0}")]
    InvalidFormat(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
