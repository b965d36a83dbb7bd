//! Cell style types
//!
//! A streaming reader only needs the part of a style that changes how a value
//! reads: its [`NumberFormat`].

mod number_format;

pub use number_format::{FormatClass, NumberFormat};
