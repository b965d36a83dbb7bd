//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The resolved value of a cell
//! - [`CellType`] - The type code a cell was written with
//! - [`CellAddress`] - A cell's location (e.g., "A1")

mod address;
mod value;

pub use address::CellAddress;
pub use value::{CellType, CellValue};
