//! # sheetstream
//!
//! Stream rows out of XLSX workbooks without loading them into memory.
//!
//! The archive is read front to back from any [`std::io::Read`] (a file, a
//! socket, a decompressor). Worksheets are handed out in workbook order; for
//! each one you decide to [`process`](WorksheetReader::process) it and pull
//! its rows, or [`skip`](WorksheetReader::skip) it.
//!
//! ## Features
//!
//! - Streaming ZIP demuxing (stored and deflated members, data descriptors,
//!   zip64 sizes)
//! - Shared strings, including rich text runs
//! - Built-in and custom number formats, both date systems
//! - Sparse rows keep their declared row numbers; empty rows are dropped
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetstream::prelude::*;
//!
//! let mut workbook = sheetstream::open("sales.xlsx")?;
//! while let Some(mut sheet) = workbook.next_worksheet()? {
//!     let name = sheet.name().to_string();
//!     let count = sheet.for_each_row(|row| {
//!         if let Some(CellValue::Text(region)) = row.value(1) {
//!             println!("{name} row {}: {region}", row.number);
//!         }
//!     })?;
//!     println!("{name}: {count} rows");
//! }
//! # Ok::<(), XlsxError>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub mod prelude;

// Re-export core types
pub use sheetstream_core::{
    format, format_value, render, Cell, CellAddress, CellType, CellValue, DateSystem, Error,
    FormatClass, NumberFormat, Result, Row, MAX_COLS, MAX_ROWS,
};

// Re-export the reader
pub use sheetstream_xlsx::{
    ErrorKind, HeaderParts, PartStatus, ReaderOptions, ReaderState, RichRun, Rows,
    SharedStrings, SheetDescriptor, SheetVisibility, StyleTable, WorkbookMetadata,
    WorksheetReader, WorksheetState, XlsxError, XlsxResult, XlsxStreamReader,
};

/// Open an XLSX file with default options
pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<XlsxStreamReader<File>> {
    XlsxStreamReader::open(path)
}

/// Stream a workbook from any byte source
pub fn from_reader<R: Read>(source: R, options: ReaderOptions) -> XlsxStreamReader<R> {
    XlsxStreamReader::with_options(source, options)
}
