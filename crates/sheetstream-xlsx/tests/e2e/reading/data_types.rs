//! Cell types: numbers, strings, booleans, errors, rich text.

use crate::{first_sheet_rows, Fixture};
use pretty_assertions::assert_eq;
use sheetstream_core::{CellType, CellValue};
use sheetstream_xlsx::ReaderOptions;

#[test]
fn test_number_values() {
    let fixture = Fixture::new().sheet(
        "Sheet1",
        r#"<row r="1"><c r="A1"><v>42</v></c><c r="B1" t="n"><v>3.14159</v></c><c r="C1"><v>-100</v></c><c r="D1"><v>1.5E-3</v></c></row>"#,
    );
    let rows = first_sheet_rows(&fixture);
    let values: Vec<_> = rows[0].cells.iter().map(|c| c.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            CellValue::Number(42.0),
            CellValue::Number(3.14159),
            CellValue::Number(-100.0),
            CellValue::Number(0.0015),
        ]
    );
}

#[test]
fn test_zero_is_kept() {
    let fixture = Fixture::new().shared_strings(&["a", "b"]).sheet(
        "Sheet1",
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
           <row r="2"><c r="A2"><v>0</v></c><c r="B2"><v>1</v></c></row>"#,
    );
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].value(1), Some(&CellValue::Number(0.0)));
    assert_eq!(rows[1].value(2), Some(&CellValue::Number(1.0)));
    assert!(rows[1].has_values());
}

#[test]
fn test_strings_booleans_and_errors() {
    let fixture = Fixture::new().shared_strings(&["Fish & Chips"]).sheet(
        "Sheet1",
        r#"<row r="1">
             <c r="A1" t="s"><v>0</v></c>
             <c r="B1" t="inlineStr"><is><t>inline &lt;text&gt;</t></is></c>
             <c r="C1" t="str"><f>UPPER("x")</f><v>X</v></c>
             <c r="D1" t="b"><v>1</v></c>
             <c r="E1" t="b"><v>0</v></c>
             <c r="F1" t="e"><f>1/0</f><v>#DIV/0!</v></c>
           </row>"#,
    );
    let rows = first_sheet_rows(&fixture);
    let row = &rows[0];
    assert_eq!(row.value(1), Some(&CellValue::text("Fish & Chips")));
    assert_eq!(row.value(2), Some(&CellValue::text("inline <text>")));
    assert_eq!(row.value(3), Some(&CellValue::text("X")));
    assert_eq!(row.value(4), Some(&CellValue::Boolean(true)));
    assert_eq!(row.value(5), Some(&CellValue::Boolean(false)));
    assert_eq!(row.value(6), Some(&CellValue::Error("#DIV/0!".into())));

    let c1 = row.cell(3).unwrap();
    assert_eq!(c1.cell_type, CellType::String);
    assert_eq!(c1.formula.as_deref(), Some("UPPER(\"x\")"));
    assert_eq!(c1.raw, "X");
}

#[test]
fn test_rich_text_keeps_interior_spaces_without_trim() {
    let sst = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
<si><t>A cell</t></si>
<si><r><rPr><b/><sz val="11"/></rPr><t>B</t></r><r><rPr><sz val="11"/></rPr><t xml:space="preserve"> cell</t></r></si>
<si><r><t>C</t></r><r><rPr><i/></rPr><t xml:space="preserve"> </t></r><r><t>cell</t></r></si>
</sst>"#;
    let fixture = Fixture::new().raw_shared_strings(sst).sheet(
        "Sheet1",
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>"#,
    );

    let mut reader = fixture.reader_with(ReaderOptions::new().trim(false).rich_text_runs(true));
    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    let mut rows = Vec::new();
    sheet.for_each_row(|r| rows.push(r)).unwrap();
    drop(sheet);

    assert_eq!(rows[0].value(2), Some(&CellValue::text("B cell")));
    assert_eq!(rows[0].value(3), Some(&CellValue::text("C cell")));

    let runs = reader.shared_strings().runs(1);
    assert_eq!(runs.len(), 2);
    assert!(runs[0].bold);
    assert_eq!(runs[1].text, " cell");
}

#[test]
fn test_trimmed_rich_text_joins_runs() {
    let sst = r#"<sst><si><r><t>B</t></r><r><t xml:space="preserve"> cell</t></r></si></sst>"#;
    let fixture = Fixture::new()
        .raw_shared_strings(sst)
        .sheet("Sheet1", r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[0].value(1), Some(&CellValue::text("Bcell")));
}

#[test]
fn test_unknown_type_code_is_text() {
    let fixture = Fixture::new().sheet(
        "Sheet1",
        r#"<row r="1"><c r="A1" t="d"><v>2024-02-29T00:00:00</v></c><c r="B1" t="custom"><v>raw</v></c></row>"#,
    );
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[0].value(1), Some(&CellValue::text("2024-02-29T00:00:00")));
    assert_eq!(rows[0].value(2), Some(&CellValue::text("raw")));
    assert_eq!(rows[0].cell(2).unwrap().cell_type, CellType::Unknown("custom".into()));
}

#[test]
fn test_escaped_control_characters() {
    let fixture = Fixture::new()
        .shared_strings(&["line1_x000D__x000A_line2"])
        .sheet("Sheet1", r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[0].value(1), Some(&CellValue::text("line1\r\nline2")));
}
