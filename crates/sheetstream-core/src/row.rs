//! Row types

use crate::cell::{CellAddress, CellType, CellValue};

/// A single cell read from a worksheet
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Location of the cell (1-based)
    pub address: CellAddress,
    /// Raw text content of the `<v>` (or inline `<t>`) element
    pub raw: String,
    /// Declared type code
    pub cell_type: CellType,
    /// Index into the workbook's cellXfs table
    pub style: u32,
    /// Formula text, if the cell carried an `<f>` element
    pub formula: Option<String>,
    /// Resolved value
    pub value: CellValue,
}

impl Cell {
    /// 1-based column number
    pub fn column(&self) -> u32 {
        self.address.col
    }
}

/// A data-bearing worksheet row
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    /// Row number (1-based) as declared by the row's `r` attribute
    pub number: u32,
    /// Raw attributes of the `<row>` element, in document order
    pub attributes: Vec<(String, String)>,
    /// Cells that carried a value, in document order
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a new, empty row
    pub fn new(number: u32) -> Self {
        Self {
            number,
            attributes: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Look up a raw row attribute by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a cell by 1-based column number
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.address.col == col)
    }

    /// Get a value by 1-based column number
    pub fn value(&self, col: u32) -> Option<&CellValue> {
        self.cell(col).map(|c| &c.value)
    }

    /// Positional view of the row: index 0 is column A, gaps are `None`.
    ///
    /// The vector is as long as the right-most populated column.
    pub fn values(&self) -> Vec<Option<&CellValue>> {
        let width = self.cells.iter().map(|c| c.address.col).max().unwrap_or(0);
        let mut out = vec![None; width as usize];
        for cell in &self.cells {
            if let Some(slot) = out.get_mut(cell.address.col as usize - 1) {
                *slot = Some(&cell.value);
            }
        }
        out
    }

    /// Whether any cell has non-empty content
    pub fn has_values(&self) -> bool {
        self.cells.iter().any(|c| !c.value.is_empty())
    }

    /// Number of cells in the row
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
