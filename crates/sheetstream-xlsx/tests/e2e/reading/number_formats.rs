//! Number format rendering through the full pipeline.

use crate::{first_sheet_rows, Fixture};
use pretty_assertions::assert_eq;
use sheetstream_core::CellValue;
use sheetstream_xlsx::ReaderOptions;

fn header_row() -> &'static str {
    r#"<row r="1"><c r="A1" t="inlineStr"><is><t>label</t></is></c></row>"#
}

#[test]
fn test_predefined_short_date() {
    let fixture = Fixture::new()
        .styles(&[], &[Some(0), Some(14)])
        .sheet(
            "Sheet1",
            &format!(
                r#"{}<row r="2"><c r="E2" s="1"><v>31682</v></c><c r="I2"><v>20064</v></c></row>"#,
                header_row()
            ),
        );
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[1].value(5), Some(&CellValue::text("9/27/86")));
    let plain = rows[1].value(9).unwrap();
    assert_eq!(plain, &CellValue::Number(20064.0));
    assert_eq!(plain.to_string(), "20064");
}

#[test]
fn test_custom_date_format() {
    let fixture = Fixture::new()
        .styles(&[(164, "dd/mm/yyyy")], &[Some(0), Some(164)])
        .sheet(
            "import",
            &format!(
                r#"{}<row r="2"><c r="B2" s="1"><v>31682</v></c><c r="C2" s="0"><v>20064</v></c></row>"#,
                header_row()
            ),
        );
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[1].value(2), Some(&CellValue::text("27/09/1986")));
    assert_eq!(rows[1].value(3).unwrap().to_string(), "20064");
}

#[test]
fn test_1904_date_system() {
    let fixture = Fixture::new()
        .date1904()
        .styles(&[(164, "dd/mm/yyyy")], &[Some(0), Some(164)])
        .sheet(
            "Sheet1",
            &format!(
                r#"{}<row r="2"><c r="B2" s="1"><v>30220</v></c></row>"#,
                header_row()
            ),
        );

    let mut reader = fixture.reader();
    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    sheet.process().unwrap();
    let rows: Vec<_> = sheet.rows().map(Result::unwrap).collect();
    assert_eq!(rows[1].value(2), Some(&CellValue::text("27/09/1986")));
    drop(sheet);
    assert_eq!(
        reader.metadata().unwrap().date_system,
        sheetstream_core::DateSystem::Excel1904
    );
}

#[test]
fn test_styles_without_number_format_ids() {
    let fixture = Fixture::new()
        .styles(&[], &[None, None])
        .shared_strings(&["city", "lambrate"])
        .sheet(
            "Sheet1",
            r#"<row r="1"><c r="A1" t="s" s="1"><v>0</v></c></row>
               <row r="2"><c r="A2" t="s" s="1"><v>1</v></c><c r="B2" s="1"><v>12.5</v></c></row>"#,
        );
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[1].value(1), Some(&CellValue::text("lambrate")));
    assert_eq!(rows[1].value(2), Some(&CellValue::Number(12.5)));
}

#[test]
fn test_numeric_custom_formats() {
    let fixture = Fixture::new()
        .styles(
            &[(165, "#,##0.00"), (166, "0.0%"), (167, "# ?/?")],
            &[Some(0), Some(165), Some(166), Some(167), Some(4)],
        )
        .sheet(
            "Sheet1",
            r#"<row r="1">
                 <c r="A1" s="1"><v>1234.5</v></c>
                 <c r="B1" s="2"><v>0.256</v></c>
                 <c r="C1" s="3"><v>1.5</v></c>
                 <c r="D1" s="4"><v>-9876.543</v></c>
               </row>"#,
        );
    let rows = first_sheet_rows(&fixture);
    let texts: Vec<String> = rows[0].cells.iter().map(|c| c.value.to_string()).collect();
    assert_eq!(texts, vec!["1,234.50", "25.6%", "1 1/2", "-9,876.54"]);
}

#[test]
fn test_text_format_passes_number_through() {
    let fixture = Fixture::new()
        .styles(&[], &[Some(0), Some(49)])
        .sheet("Sheet1", r#"<row r="1"><c r="A1" s="1"><v>42</v></c></row>"#);
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[0].value(1), Some(&CellValue::Number(42.0)));
}

#[test]
fn test_formatting_can_be_turned_off() {
    let fixture = Fixture::new()
        .styles(&[], &[Some(0), Some(14)])
        .sheet("Sheet1", r#"<row r="1"><c r="A1" s="1"><v>31682</v></c></row>"#);
    let mut reader = fixture.reader_with(ReaderOptions::new().format_values(false));
    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    let mut rows = Vec::new();
    sheet.for_each_row(|r| rows.push(r)).unwrap();
    assert_eq!(rows[0].value(1), Some(&CellValue::Number(31682.0)));
    assert_eq!(rows[0].cells[0].style, 1);
}

#[test]
fn test_style_index_past_cell_xfs_is_general() {
    let fixture = Fixture::new()
        .styles(&[], &[Some(0)])
        .sheet("Sheet1", r#"<row r="1"><c r="A1" s="9"><v>3</v></c></row>"#);
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows[0].value(1), Some(&CellValue::Number(3.0)));
}
