//! Cell value types

use std::fmt;

/// A resolved cell value.
///
/// The variant is decided once, when the cell is read, from the cell's type
/// code and number format. Numbers that carry a date or custom display format
/// are rendered to [`CellValue::Text`]; numbers without a display format stay
/// [`CellValue::Number`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Numeric value without a display format
    Number(f64),

    /// Text, including shared strings and formatted numbers/dates
    Text(String),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Error marker as written in the file (`#DIV/0!`, `#N/A`, ...)
    Error(String),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Whether this value carries displayable content.
    ///
    /// Only empty text counts as empty: a numeric zero or `FALSE` is data.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    /// Check if the value is an error marker
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
            CellValue::Error(_) => "error",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64's Display already drops the fraction for integral values: 20064.0 -> "20064"
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// The `t` attribute of a `<c>` element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
    /// `s` - index into the shared string table
    SharedString,
    /// `str` - formula string result
    String,
    /// `inlineStr` - text stored in an `<is>` child
    InlineString,
    /// `b` - boolean stored as `1`/`0`
    Boolean,
    /// `e` - error marker
    Error,
    /// `n` or no attribute
    #[default]
    Number,
    /// `d` - ISO 8601 date text
    Date,
    /// Any other code; the raw text is kept verbatim
    Unknown(String),
}

impl CellType {
    /// Map a `t` attribute value to a cell type
    pub fn from_code(code: &str) -> Self {
        match code {
            "s" => CellType::SharedString,
            "str" => CellType::String,
            "inlineStr" => CellType::InlineString,
            "b" => CellType::Boolean,
            "e" => CellType::Error,
            "n" | "" => CellType::Number,
            "d" => CellType::Date,
            other => CellType::Unknown(other.to_string()),
        }
    }

    /// The attribute value this type is written as
    pub fn code(&self) -> &str {
        match self {
            CellType::SharedString => "s",
            CellType::String => "str",
            CellType::InlineString => "inlineStr",
            CellType::Boolean => "b",
            CellType::Error => "e",
            CellType::Number => "n",
            CellType::Date => "d",
            CellType::Unknown(code) => code,
        }
    }
}
