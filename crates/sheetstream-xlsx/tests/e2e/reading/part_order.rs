//! Header parts and worksheets arriving in different archive orders.

use crate::{read_all, Fixture, Layout};
use pretty_assertions::assert_eq;
use sheetstream_core::CellValue;
use sheetstream_xlsx::{PartStatus, ReaderOptions, ReaderState, WorksheetState};

fn three_sheets(layout: Layout) -> Fixture {
    Fixture::new()
        .layout(layout)
        .styles(&[(164, "dd/mm/yyyy")], &[Some(0), Some(164)])
        .shared_strings(&["alpha", "beta", "gamma"])
        .sheet("First", r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="1"><v>31682</v></c></row>"#)
        .sheet("Second", r#"<row r="1"><c r="A1" t="s"><v>1</v></c></row>"#)
        .sheet("Third", r#"<row r="1"><c r="A1" t="s"><v>2</v></c></row>"#)
}

fn summary(fixture: &Fixture) -> Vec<(String, CellValue)> {
    let sheets = read_all(&mut fixture.reader()).unwrap();
    sheets
        .into_iter()
        .map(|s| (s.name, s.rows[0].cells[0].value.clone()))
        .collect()
}

fn expected() -> Vec<(String, CellValue)> {
    vec![
        ("First".to_string(), CellValue::text("alpha")),
        ("Second".to_string(), CellValue::text("beta")),
        ("Third".to_string(), CellValue::text("gamma")),
    ]
}

#[test]
fn test_tables_after_sheets() {
    assert_eq!(summary(&three_sheets(Layout::SheetsBeforeTables)), expected());
}

#[test]
fn test_tables_first() {
    assert_eq!(summary(&three_sheets(Layout::TablesFirst)), expected());
}

#[test]
fn test_sheets_before_workbook() {
    assert_eq!(summary(&three_sheets(Layout::SheetsFirst)), expected());
}

#[test]
fn test_sheets_in_reverse_archive_order() {
    let fixture = three_sheets(Layout::TablesFirst).reverse_sheets();
    assert_eq!(summary(&fixture), expected());
}

#[test]
fn test_styles_apply_to_spooled_sheets() {
    let sheets = read_all(&mut three_sheets(Layout::SheetsBeforeTables).reader()).unwrap();
    assert_eq!(sheets[0].rows[0].value(2), Some(&CellValue::text("27/09/1986")));
}

#[test]
fn test_spool_dir_option() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = three_sheets(Layout::SheetsFirst);
    let mut reader = fixture.reader_with(ReaderOptions::new().spool_dir(dir.path()));
    let sheets = read_all(&mut reader).unwrap();
    assert_eq!(sheets.len(), 3);
}

#[test]
fn test_header_gate_and_states() {
    let fixture = three_sheets(Layout::TablesFirst);
    let mut reader = fixture.reader();
    assert_eq!(reader.state(), ReaderState::Opening);
    assert!(reader.metadata().is_none());

    {
        let sheet = reader.next_worksheet().unwrap().unwrap();
        assert_eq!(sheet.name(), "First");
        assert_eq!(sheet.sheet_id(), 1);
        assert_eq!(sheet.path(), "xl/worksheets/sheet1.xml");
        assert_eq!(sheet.state(), WorksheetState::Unstarted);
    }
    assert_eq!(reader.state(), ReaderState::EmittingSheets);
    let parts = reader.header_parts();
    assert!(parts.is_ready());
    assert_eq!(parts.styles, PartStatus::Loaded);
    assert_eq!(parts.shared_strings, PartStatus::Loaded);
    assert_eq!(reader.shared_strings().len(), 3);
    assert_eq!(reader.styles().len(), 2);
    assert_eq!(
        reader.metadata().unwrap().sheet_names(),
        vec!["First", "Second", "Third"]
    );

    while reader.next_worksheet().unwrap().is_some() {}
    assert_eq!(reader.state(), ReaderState::Ended);
    assert!(reader.next_worksheet().unwrap().is_none());
}

#[test]
fn test_optional_parts_absent() {
    let fixture = Fixture::new().sheet(
        "Only",
        r#"<row r="1"><c r="A1"><v>7</v></c><c r="B1" s="3"><v>8</v></c></row>"#,
    );
    let mut reader = fixture.reader();
    let sheets = read_all(&mut reader).unwrap();
    assert_eq!(sheets[0].rows[0].value(2), Some(&CellValue::Number(8.0)));
    let parts = reader.header_parts();
    assert_eq!(parts.styles, PartStatus::Absent);
    assert_eq!(parts.shared_strings, PartStatus::Absent);
}

#[test]
fn test_skip_and_drop_do_not_stall() {
    let fixture = three_sheets(Layout::TablesFirst);
    let mut reader = fixture.reader();

    let mut first = reader.next_worksheet().unwrap().unwrap();
    first.skip().unwrap();
    assert_eq!(first.state(), WorksheetState::Ended);
    assert!(first.next_row().unwrap().is_none());
    assert_eq!(first.row_count(), 0);
    drop(first);

    // dropped without a decision
    let second = reader.next_worksheet().unwrap().unwrap();
    assert_eq!(second.name(), "Second");
    drop(second);

    let mut third = reader.next_worksheet().unwrap().unwrap();
    assert_eq!(third.name(), "Third");
    third.process().unwrap();
    let row = third.next_row().unwrap().unwrap();
    assert_eq!(row.value(1), Some(&CellValue::text("gamma")));
}

#[test]
fn test_skipped_sheet_is_not_resolved() {
    // the first sheet references a shared string that does not exist
    let fixture = Fixture::new()
        .layout(Layout::TablesFirst)
        .shared_strings(&["ok"])
        .sheet("Broken", r#"<row r="1"><c r="A1" t="s"><v>99</v></c></row>"#)
        .sheet("Fine", r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);

    let mut reader = fixture.reader();
    reader.next_worksheet().unwrap().unwrap().skip().unwrap();
    let mut fine = reader.next_worksheet().unwrap().unwrap();
    let mut rows = Vec::new();
    fine.for_each_row(|r| rows.push(r)).unwrap();
    assert_eq!(rows[0].value(1), Some(&CellValue::text("ok")));
}

#[test]
fn test_missing_worksheet_member_is_skipped() {
    let fixture = three_sheets(Layout::TablesFirst);
    let members: Vec<_> = fixture
        .members()
        .into_iter()
        .filter(|(name, _)| name != "xl/worksheets/sheet2.xml")
        .collect();
    let bytes = crate::zip_members(&members);

    let mut reader = sheetstream_xlsx::XlsxStreamReader::new(&bytes[..]);
    let names: Vec<String> = read_all(&mut reader)
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["First", "Third"]);
}
