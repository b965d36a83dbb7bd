//! # sheetstream-xlsx
//!
//! Streaming XLSX (Office Open XML) reader for sheetstream.
//!
//! The archive is read front to back from any [`std::io::Read`]; nothing
//! needs to seek. Worksheets are handed out one at a time and their rows are
//! pulled on demand, so memory stays flat no matter how large a sheet is.

pub mod error;
pub mod options;
pub mod reader;
pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod xml;
pub mod zip_stream;

pub use error::{ErrorKind, XlsxError, XlsxResult};
pub use options::ReaderOptions;
pub use reader::{
    HeaderParts, PartStatus, ReaderState, Rows, SheetContext, WorksheetReader, WorksheetState,
    XlsxStreamReader,
};
pub use shared_strings::{RichRun, SharedStrings};
pub use styles::StyleTable;
pub use workbook::{SheetDescriptor, SheetVisibility, WorkbookMetadata};
