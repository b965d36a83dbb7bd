//! Number format interpreter
//!
//! Turns a raw numeric cell value into the text a spreadsheet would display
//! for it, given the cell's number format code and the workbook's date
//! system. Covers the token classes real files use for display:
//!
//! - numeric placeholders (`0`, `#`, `?`), decimal point, thousands grouping
//!   and scaling commas
//! - percentages, scientific notation (`0.00E+00`), fractions (`# ?/?`)
//! - dates, times and elapsed durations (`yyyy-mm-dd`, `h:mm AM/PM`, `[h]:mm`)
//! - literal text: quoted strings, `\x` escapes, `_x` spacing
//! - up to four `;`-separated sections, colours and simple conditions
//!
//! Anything outside that (text placeholders applied to numbers, `[DBNum1]`
//! and other locale extensions, negative dates) is not rendered: the value
//! passes through as a plain [`CellValue::Number`].

mod date;
mod number;

pub use date::{DateSystem, ExcelDate};

use crate::cell::CellValue;
use crate::style::NumberFormat;

/// Render a numeric cell value through its number format.
///
/// General formats (and codes that cannot be rendered) yield
/// [`CellValue::Number`]; every other format yields [`CellValue::Text`].
///
/// ```
/// use sheetstream_core::format::{render, DateSystem};
/// use sheetstream_core::{CellValue, NumberFormat};
///
/// let date = render(31682.0, &NumberFormat::BuiltIn(14), DateSystem::Excel1900);
/// assert_eq!(date, CellValue::text("9/27/86"));
///
/// let zero = render(0.0, &NumberFormat::General, DateSystem::Excel1900);
/// assert_eq!(zero, CellValue::Number(0.0));
/// ```
pub fn render(value: f64, format: &NumberFormat, date_system: DateSystem) -> CellValue {
    if format.is_general() {
        return CellValue::Number(value);
    }
    match format_number(value, format.format_code(), date_system) {
        Some(text) => CellValue::Text(text),
        None => CellValue::Number(value),
    }
}

/// Format a value with a format code, always producing a display string.
///
/// Codes that cannot be rendered fall back to the plain number.
pub fn format_value(value: f64, code: &str, date_system: DateSystem) -> String {
    format_number(value, code, date_system)
        .unwrap_or_else(|| CellValue::Number(value).to_string())
}

/// Format a value with a format code.
///
/// Returns `None` when the code (or the section selected for `value`) has no
/// numeric rendering and the number should be shown as-is.
pub fn format_number(value: f64, code: &str, date_system: DateSystem) -> Option<String> {
    if !value.is_finite() || code.trim().eq_ignore_ascii_case("general") {
        return None;
    }

    let sections = split_sections(code)
        .into_iter()
        .map(Section::parse)
        .collect::<Option<Vec<_>>>()?;

    let selected = select_section(&sections, value)?;
    let section = selected.section;

    if section.is_date() {
        return date::format_datetime(value, &section.tokens, date_system);
    }

    let body = number::format_section(selected.magnitude, &section.tokens)?;
    // a negative that rounds to zero keeps its sign, "-0"
    if selected.auto_sign && value < 0.0 {
        Some(format!("-{}", body))
    } else {
        Some(body)
    }
}

/// The first `;`-separated section of a format code
pub(crate) fn first_section(code: &str) -> &str {
    split_sections(code).into_iter().next().unwrap_or(code)
}

/// Split a code on `;` outside quotes, escapes and brackets
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escape = false;

    for (idx, ch) in code.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        if in_brackets {
            if ch == ']' {
                in_brackets = false;
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '\\' => escape = true,
            '[' => in_brackets = true,
            ';' => {
                sections.push(&code[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// Digit placeholder kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placeholder {
    /// `0` - always shows a digit
    Zero,
    /// `#` - shows significant digits only
    Hash,
    /// `?` - pads insignificant digits with a space
    Question,
}

/// Date and time tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DatePart {
    Year(usize),
    /// `m` runs are months until [`date`] decides they are minutes
    Month(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    SubSecond(usize),
    AmPm { short: bool, lower: bool },
    Elapsed { unit: char, width: usize },
}

/// A lexical token of one format section
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Literal(String),
    Digit(Placeholder),
    Point,
    Comma,
    Percent,
    Exponent { plus: bool },
    Slash,
    /// Literal denominator after a `/`, as in `# ?/8`
    Denominator(u32),
    General,
    Text,
    Date(DatePart),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Condition {
    op: Comparison,
    rhs: f64,
}

impl Condition {
    fn parse(inner: &str) -> Option<Self> {
        let (op, rest) = [
            ("<=", Comparison::Le),
            (">=", Comparison::Ge),
            ("<>", Comparison::Ne),
            ("<", Comparison::Lt),
            (">", Comparison::Gt),
            ("=", Comparison::Eq),
        ]
        .iter()
        .find_map(|(prefix, op)| inner.strip_prefix(prefix).map(|rest| (*op, rest)))?;
        let rhs = rest.trim().parse::<f64>().ok()?;
        Some(Self { op, rhs })
    }

    fn matches(&self, value: f64) -> bool {
        match self.op {
            Comparison::Lt => value < self.rhs,
            Comparison::Le => value <= self.rhs,
            Comparison::Gt => value > self.rhs,
            Comparison::Ge => value >= self.rhs,
            Comparison::Eq => value == self.rhs,
            Comparison::Ne => value != self.rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Section {
    tokens: Vec<Token>,
    condition: Option<Condition>,
}

struct Selected<'a> {
    section: &'a Section,
    magnitude: f64,
    auto_sign: bool,
}

const COLOURS: [&str; 8] = [
    "black", "blue", "cyan", "green", "magenta", "red", "white", "yellow",
];

impl Section {
    /// Tokenize one section. `None` means the section uses tokens we do not render.
    fn parse(section: &str) -> Option<Self> {
        let chars: Vec<char> = section.chars().collect();
        let mut tokens = Vec::new();
        let mut condition = None;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '"' => {
                    let mut literal = String::new();
                    i += 1;
                    while i < chars.len() && chars[i] != '"' {
                        literal.push(chars[i]);
                        i += 1;
                    }
                    push_literal(&mut tokens, &literal);
                    i += 1;
                }
                '\\' => {
                    if let Some(next) = chars.get(i + 1) {
                        push_literal(&mut tokens, &next.to_string());
                    }
                    i += 2;
                }
                '_' => {
                    push_literal(&mut tokens, " ");
                    i += 2;
                }
                '*' => {
                    i += 2;
                }
                '[' => {
                    let end = chars[i..].iter().position(|&c| c == ']')? + i;
                    let inner: String = chars[i + 1..end].iter().collect();
                    i = end + 1;
                    let lower = inner.to_ascii_lowercase();
                    if let Some(unit) = elapsed_unit(&lower) {
                        tokens.push(Token::Date(DatePart::Elapsed {
                            unit,
                            width: lower.len(),
                        }));
                    } else if let Some(currency) = inner.strip_prefix('$') {
                        let symbol = currency.split('-').next().unwrap_or("");
                        push_literal(&mut tokens, symbol);
                    } else if lower.starts_with(['<', '>', '=']) {
                        condition = Some(Condition::parse(&lower)?);
                    } else if COLOURS.contains(&lower.as_str())
                        || lower
                            .strip_prefix("color")
                            .is_some_and(|n| n.parse::<u8>().is_ok())
                    {
                        // colours only affect rendering, not text
                    } else {
                        return None;
                    }
                }
                '0' => {
                    tokens.push(Token::Digit(Placeholder::Zero));
                    i += 1;
                }
                '#' => {
                    tokens.push(Token::Digit(Placeholder::Hash));
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::Digit(Placeholder::Question));
                    i += 1;
                }
                '.' => {
                    tokens.push(Token::Point);
                    i += 1;
                }
                ',' => {
                    tokens.push(Token::Comma);
                    i += 1;
                }
                '%' => {
                    tokens.push(Token::Percent);
                    i += 1;
                }
                '@' => {
                    tokens.push(Token::Text);
                    i += 1;
                }
                '/' => {
                    tokens.push(Token::Slash);
                    i += 1;
                    if matches!(chars.get(i), Some('1'..='9')) {
                        let start = i;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                        let digits: String = chars[start..i].iter().collect();
                        tokens.push(Token::Denominator(digits.parse().ok()?));
                    }
                }
                'E' | 'e' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                    tokens.push(Token::Exponent {
                        plus: chars[i + 1] == '+',
                    });
                    i += 2;
                }
                'G' | 'g' if starts_with_ignore_case(&chars[i..], "general") => {
                    tokens.push(Token::General);
                    i += "general".len();
                }
                'A' | 'a' if starts_with_ignore_case(&chars[i..], "am/pm") => {
                    tokens.push(Token::Date(DatePart::AmPm {
                        short: false,
                        lower: c == 'a',
                    }));
                    i += "am/pm".len();
                }
                'A' | 'a' if starts_with_ignore_case(&chars[i..], "a/p") => {
                    tokens.push(Token::Date(DatePart::AmPm {
                        short: true,
                        lower: c == 'a',
                    }));
                    i += "a/p".len();
                }
                'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => {
                    let letter = c.to_ascii_lowercase();
                    let start = i;
                    while i < chars.len() && chars[i].to_ascii_lowercase() == letter {
                        i += 1;
                    }
                    let n = i - start;
                    tokens.push(Token::Date(match letter {
                        'y' => DatePart::Year(n),
                        'm' => DatePart::Month(n),
                        'd' => DatePart::Day(n),
                        'h' => DatePart::Hour(n),
                        _ => DatePart::Second(n),
                    }));
                }
                other => {
                    push_literal(&mut tokens, &other.to_string());
                    i += 1;
                }
            }
        }

        Some(Self { tokens, condition })
    }

    fn is_date(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Date(_)))
    }
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Literal(last)) = tokens.last_mut() {
        last.push_str(text);
    } else {
        tokens.push(Token::Literal(text.to_string()));
    }
}

fn starts_with_ignore_case(chars: &[char], word: &str) -> bool {
    let n = word.chars().count();
    chars.len() >= n
        && chars[..n]
            .iter()
            .zip(word.chars())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}

fn elapsed_unit(lower: &str) -> Option<char> {
    let first = lower.chars().next()?;
    (matches!(first, 'h' | 'm' | 's') && lower.chars().all(|c| c == first)).then_some(first)
}

/// Pick the section that applies to `value`.
///
/// With one section, negatives get an automatic minus sign. With two or more,
/// the second section renders negatives (without a sign) and the third renders
/// zero. Conditional sections are tried in order, the first unconditional one
/// acting as the fallback.
fn select_section(sections: &[Section], value: f64) -> Option<Selected<'_>> {
    let numeric = &sections[..sections.len().min(3)];

    if numeric.iter().any(|s| s.condition.is_some()) {
        return numeric
            .iter()
            .find(|s| s.condition.map_or(true, |c| c.matches(value)))
            .map(|section| Selected {
                section,
                magnitude: value.abs(),
                auto_sign: true,
            });
    }

    let (index, auto_sign) = match numeric.len() {
        0 => return None,
        1 => (0, true),
        2 if value < 0.0 => (1, false),
        2 => (0, true),
        _ if value > 0.0 => (0, true),
        _ if value < 0.0 => (1, false),
        _ => (2, true),
    };

    Some(Selected {
        section: &numeric[index],
        magnitude: value.abs(),
        auto_sign,
    })
}
