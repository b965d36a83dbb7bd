//! # sheetstream-core
//!
//! Core data structures for the sheetstream XLSX reader.
//!
//! This crate holds the pieces that do not depend on the container format:
//! - [`CellValue`] and [`CellType`] - resolved values and declared type codes
//! - [`CellAddress`] - A1-style cell references
//! - [`Row`] and [`Cell`] - what a worksheet reader emits
//! - [`NumberFormat`] - built-in and custom number formats
//! - [`format`] - the number-format interpreter that renders values for display
//!
//! ## Example
//!
//! ```rust
//! use sheetstream_core::{render, CellValue, DateSystem, NumberFormat};
//!
//! let fmt = NumberFormat::custom(164, "dd/mm/yyyy");
//! assert_eq!(
//!     render(31682.0, &fmt, DateSystem::Excel1900),
//!     CellValue::text("27/09/1986")
//! );
//! ```

pub mod cell;
pub mod error;
pub mod format;
pub mod row;
pub mod style;

// Re-exports for convenience
pub use cell::{CellAddress, CellType, CellValue};
pub use error::{Error, Result};
pub use format::{format_value, render, DateSystem};
pub use row::{Cell, Row};
pub use style::{FormatClass, NumberFormat};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
