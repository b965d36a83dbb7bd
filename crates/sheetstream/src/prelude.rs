//! Prelude module - common imports for sheetstream users
//!
//! ```rust
//! use sheetstream::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellAddress,
    CellType,
    CellValue,
    DateSystem,
    NumberFormat,
    // Reader
    ReaderOptions,
    Row,
    WorksheetReader,
    WorksheetState,
    XlsxStreamReader,
    // Error types
    ErrorKind,
    XlsxError,
    XlsxResult,
};
