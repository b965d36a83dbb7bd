//! Number format types

/// Number format attached to a cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// General format (default, also used when a style has no format)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format declared in `<numFmts>`
    Custom {
        /// The `numFmtId` the code was declared under
        id: u32,
        /// The format code
        code: String,
    },
}

/// Broad category of a number format, used to pick a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormatClass {
    /// No formatting, numbers pass through
    General,
    /// Fixed-point / grouped numbers
    Number,
    /// Percentages
    Percent,
    /// Fractions (`# ?/?`)
    Fraction,
    /// Scientific notation
    Scientific,
    /// Dates, times, and elapsed durations
    Date,
    /// Text placeholder (`@`)
    Text,
}

impl NumberFormat {
    /// General format
    pub const GENERAL: Self = NumberFormat::General;

    // Built-in format IDs
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 11 - 0.00E+00
    pub const ID_SCIENTIFIC: u32 = 11;
    /// 12 - # ?/?
    pub const ID_FRACTION: u32 = 12;
    /// 13 - # ??/??
    pub const ID_FRACTION2: u32 = 13;
    /// 14 - m/d/yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Resolve a `numFmtId` with no custom declaration
    pub fn from_id(id: u32) -> Self {
        if id == Self::ID_GENERAL {
            NumberFormat::General
        } else {
            NumberFormat::BuiltIn(id)
        }
    }

    /// Create a custom format
    pub fn custom<S: Into<String>>(id: u32, code: S) -> Self {
        NumberFormat::Custom {
            id,
            code: code.into(),
        }
    }

    /// The `numFmtId` of this format
    pub fn id(&self) -> u32 {
        match self {
            NumberFormat::General => Self::ID_GENERAL,
            NumberFormat::BuiltIn(id) => *id,
            NumberFormat::Custom { id, .. } => *id,
        }
    }

    /// Get the format code
    pub fn format_code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_code(*id),
            NumberFormat::Custom { code, .. } => code,
        }
    }

    /// Whether numbers under this format pass through unformatted
    pub fn is_general(&self) -> bool {
        self.format_code().trim().eq_ignore_ascii_case("general")
    }

    /// Get the en-US code for a built-in format id.
    ///
    /// Unknown ids map to `General`. The locale-specific East Asian ids are
    /// mapped to their closest en-US equivalent.
    pub fn builtin_format_code(id: u32) -> &'static str {
        match id {
            0 => "General",
            1 | 59 => "0",
            2 | 60 => "0.00",
            3 | 61 => "#,##0",
            4 | 62 => "#,##0.00",
            5 => "\"$\"#,##0_);\\(\"$\"#,##0\\)",
            6 => "\"$\"#,##0_);[Red]\\(\"$\"#,##0\\)",
            7 => "\"$\"#,##0.00_);\\(\"$\"#,##0.00\\)",
            8 => "\"$\"#,##0.00_);[Red]\\(\"$\"#,##0.00\\)",
            9 | 67 => "0%",
            10 | 68 => "0.00%",
            11 => "0.00E+00",
            12 | 69 => "# ?/?",
            13 | 70 => "# ??/??",
            14 | 27..=31 | 36 | 50..=58 => "m/d/yy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 | 32..=35 => "h:mm:ss",
            22 => "m/d/yy h:mm",
            37 => "#,##0 ;(#,##0)",
            38 => "#,##0 ;[Red](#,##0)",
            39 => "#,##0.00;(#,##0.00)",
            40 => "#,##0.00;[Red](#,##0.00)",
            41 => "_(* #,##0_);_(* \\(#,##0\\);_(* \"-\"_);_(@_)",
            42 => "_(\"$\"* #,##0_);_(\"$\"* \\(#,##0\\);_(\"$\"* \"-\"_);_(@_)",
            43 => "_(* #,##0.00_);_(* \\(#,##0.00\\);_(* \"-\"??_);_(@_)",
            44 => "_(\"$\"* #,##0.00_);_(\"$\"* \\(#,##0.00\\);_(\"$\"* \"-\"??_);_(@_)",
            45 => "mm:ss",
            46 => "[h]:mm:ss",
            47 => "mmss.0",
            48 => "##0.0E+0",
            49 => "@",
            _ => "General",
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => {
                matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
            }
            NumberFormat::Custom { code, .. } => is_date_code(code),
        }
    }

    /// Classify the format for rendering
    pub fn class(&self) -> FormatClass {
        if self.is_general() {
            return FormatClass::General;
        }
        if self.is_date_format() {
            return FormatClass::Date;
        }
        let code = self.format_code();
        let first = crate::format::first_section(code);
        let visible = unquoted(first);
        if visible.contains('@') && !visible.contains(['0', '#', '?']) {
            FormatClass::Text
        } else if visible.contains('%') {
            FormatClass::Percent
        } else if visible.contains(['E', 'e']) && visible.contains(['+', '-']) {
            FormatClass::Scientific
        } else if visible.contains('/') {
            FormatClass::Fraction
        } else {
            FormatClass::Number
        }
    }
}

/// Characters of a format code that are not inside quotes, escapes, or brackets
fn unquoted(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                for q in chars.by_ref() {
                    if q == ']' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Whether a custom code contains date/time tokens.
///
/// Tokens inside quotes, escapes and colour/condition brackets do not count;
/// elapsed-time brackets (`[h]`, `[mm]`, `[ss]`) do.
fn is_date_code(code: &str) -> bool {
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let mut inner = String::new();
                for q in chars.by_ref() {
                    if q == ']' {
                        break;
                    }
                    inner.push(q);
                }
                let lower = inner.to_ascii_lowercase();
                if !lower.is_empty()
                    && (lower.chars().all(|c| c == 'h')
                        || lower.chars().all(|c| c == 'm')
                        || lower.chars().all(|c| c == 's'))
                {
                    return true;
                }
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {}
        }
    }
    false
}
