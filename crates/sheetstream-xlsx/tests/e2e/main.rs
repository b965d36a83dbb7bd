//! End-to-end tests for sheetstream-xlsx.
//!
//! Each test builds the archive it needs in memory (see [`common::Fixture`]),
//! streams it through `XlsxStreamReader` and asserts on the rows that come
//! out. Member order inside the archive is part of what is under test, so
//! fixtures choose their layout explicitly.


// Re-export common utilities for submodules
pub use common::*;
