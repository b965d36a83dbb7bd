//! Cell value resolution

use sheetstream_core::{render, CellType, CellValue, DateSystem, NumberFormat};

use crate::error::{XlsxError, XlsxResult};
use crate::shared_strings::{decode_escapes, SharedStrings};
use crate::styles::StyleTable;

/// Read-only workbook state a worksheet needs to resolve its cells
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub shared_strings: &'a SharedStrings,
    pub styles: &'a StyleTable,
    pub date_system: DateSystem,
    /// Render numbers through their number format
    pub format_values: bool,
}

/// Turn a cell's raw content into a typed value.
///
/// `reference` is only used in error messages. Unknown type codes never fail;
/// their raw text is returned as [`CellValue::Text`].
///
/// ```
/// use sheetstream_core::{CellType, CellValue, NumberFormat};
/// use sheetstream_xlsx::reader::{resolve_cell, SheetContext};
/// use sheetstream_xlsx::{SharedStrings, StyleTable};
///
/// let strings = SharedStrings::from_strings(["lambrate"]);
/// let styles = StyleTable::default();
/// let ctx = SheetContext {
///     shared_strings: &strings,
///     styles: &styles,
///     date_system: Default::default(),
///     format_values: true,
/// };
///
/// let general = NumberFormat::General;
/// let value = resolve_cell("0", &CellType::SharedString, "B2", &general, &ctx).unwrap();
/// assert_eq!(value, CellValue::text("lambrate"));
///
/// let date = NumberFormat::BuiltIn(14);
/// let value = resolve_cell("31682", &CellType::Number, "E2", &date, &ctx).unwrap();
/// assert_eq!(value, CellValue::text("9/27/86"));
/// ```
pub fn resolve_cell(
    raw: &str,
    cell_type: &CellType,
    reference: &str,
    format: &NumberFormat,
    ctx: &SheetContext<'_>,
) -> XlsxResult<CellValue> {
    let value = match cell_type {
        CellType::SharedString => {
            let index = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid_number(reference, raw))?;
            CellValue::Text(ctx.shared_strings.get(index)?.to_string())
        }
        CellType::String | CellType::InlineString => {
            CellValue::Text(decode_escapes(raw).into_owned())
        }
        CellType::Boolean => CellValue::Boolean(matches!(raw.trim(), "1" | "true")),
        CellType::Error => CellValue::Error(raw.to_string()),
        CellType::Number => {
            let number = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid_number(reference, raw))?;
            if ctx.format_values {
                render(number, format, ctx.date_system)
            } else {
                CellValue::Number(number)
            }
        }
        CellType::Date | CellType::Unknown(_) => CellValue::Text(raw.to_string()),
    };
    Ok(value)
}

fn invalid_number(reference: &str, raw: &str) -> XlsxError {
    XlsxError::InvalidNumber {
        reference: reference.to_string(),
        raw: raw.to_string(),
    }
}
