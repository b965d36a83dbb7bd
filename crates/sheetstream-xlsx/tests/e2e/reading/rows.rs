//! Row assembly, numbering and counting.

use crate::{first_sheet_rows, read_all, Fixture};
use pretty_assertions::assert_eq;
use sheetstream_core::CellValue;
use sheetstream_xlsx::WorksheetState;

fn row_counter_fixture() -> Fixture {
    Fixture::new()
        .styles(&[], &[Some(0), Some(0)])
        .sheet(
            "no data",
            r#"<row r="1" s="1" customFormat="1"><c r="A1" s="1"/><c r="B1" s="1"/></row>
               <row r="2" ht="30" customHeight="1"/>"#,
        )
        .sheet(
            "formatted cells",
            r#"<row r="1"><c r="A1" s="1"/></row>
               <row r="2"><c r="A2"><v>1</v></c><c r="B2" s="1"/></row>
               <row r="3"><c r="A3" s="1"/><c r="B3" s="1"/></row>
               <row r="4"><c r="B4" s="1"><v>2</v></c></row>
               <row r="5"><c r="A5" s="1"></c></row>"#,
        )
}

fn row_count_of(fixture: &Fixture, wanted: &str) -> usize {
    let mut reader = fixture.reader();
    let mut count = None;
    while let Some(mut sheet) = reader.next_worksheet().unwrap() {
        if sheet.name() != wanted {
            sheet.skip().unwrap();
            continue;
        }
        sheet.process().unwrap();
        while sheet.next_row().unwrap().is_some() {}
        assert_eq!(sheet.state(), WorksheetState::Ended);
        count = Some(sheet.row_count());
    }
    count.expect("sheet not found")
}

#[test]
fn test_row_count_without_data_is_zero() {
    assert_eq!(row_count_of(&row_counter_fixture(), "no data"), 0);
}

#[test]
fn test_formatting_only_rows_are_not_counted() {
    assert_eq!(row_count_of(&row_counter_fixture(), "formatted cells"), 2);
}

#[test]
fn test_row_count_matches_emitted_rows() {
    let sheets = read_all(&mut row_counter_fixture().reader()).unwrap();
    for sheet in sheets {
        assert_eq!(sheet.row_count, sheet.rows.len(), "sheet '{}'", sheet.name);
    }
}

#[test]
fn test_empty_rows_are_omitted() {
    let fixture = Fixture::new().sheet(
        "Sheet1",
        r#"<row r="1" spans="1:2"/>
           <row r="2" spans="1:2"><c r="A2" t="inlineStr"><is><t>first data</t></is></c></row>"#,
    );
    let rows = first_sheet_rows(&fixture);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].attribute("r"), Some("2"));
    assert_eq!(rows[0].number, 2);
}

#[test]
fn test_sparse_rows_keep_declared_numbers() {
    let fixture = Fixture::new().sheet(
        "Sheet1",
        r#"<row r="3"><c r="C3"><v>1</v></c></row>
           <row r="10"><c r="A10"><v>2</v></c></row>
           <row r="1048576"><c r="XFD1048576"><v>3</v></c></row>"#,
    );
    let rows = first_sheet_rows(&fixture);
    let numbers: Vec<u32> = rows.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![3, 10, 1_048_576]);

    let values = rows[0].values();
    assert_eq!(values, vec![None, None, Some(&CellValue::Number(1.0))]);
    assert_eq!(rows[2].cells[0].address.col, 16_384);
}

#[test]
fn test_prefixed_nodes_and_uppercase_member_name() {
    let header = ["Category ID", "Parent category ID", "Name DE", "Name FR", "Name IT", "Name EN", "GS1 ID"];
    let mut strings: Vec<&str> = header.to_vec();
    strings.push("Food");

    let header_cells: String = (0..header.len())
        .map(|i| {
            let col = (b'A' + i as u8) as char;
            format!(r#"<x:c r="{col}1" t="s"><x:v>{i}</x:v></x:c>"#)
        })
        .collect();
    let mut rows = format!(r#"<x:row r="1">{header_cells}</x:row>"#);
    for r in 2..=24 {
        rows.push_str(&format!(
            r#"<x:row r="{r}"><x:c r="A{r}"><x:v>{r}</x:v></x:c><x:c r="C{r}" t="s"><x:v>7</x:v></x:c></x:row>"#
        ));
    }
    let xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><x:worksheet xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><x:sheetData>{rows}</x:sheetData></x:worksheet>"#
    );

    let fixture = Fixture::new()
        .shared_strings(&strings)
        .sheet_file("Categories", "Sheet1.xml", &xml);
    let rows = first_sheet_rows(&fixture);

    assert_eq!(rows.len(), 24);
    let first: Vec<String> = rows[0].cells.iter().map(|c| c.value.to_string()).collect();
    assert_eq!(first, header.to_vec());
    assert_eq!(rows[23].value(3), Some(&CellValue::text("Food")));
}

#[test]
fn test_dimension_is_reported() {
    let xml = r#"<worksheet><dimension ref="A1:B2"/><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData></worksheet>"#;
    let fixture = Fixture::new().sheet_file("Sheet1", "sheet1.xml", xml);
    let mut reader = fixture.reader();
    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    assert_eq!(sheet.dimension(), None);
    sheet.process().unwrap();
    let row = sheet.next_row().unwrap().unwrap();
    assert_eq!(row.number, 1);
    assert_eq!(sheet.dimension(), Some("A1:B2"));
}

#[test]
fn test_large_sheet() {
    let mut rows = String::with_capacity(80_000 * 64);
    for r in 1..=80_000u32 {
        rows.push_str(&format!(
            r#"<row r="{r}"><c r="A{r}"><v>{r}</v></c><c r="B{r}" t="inlineStr"><is><t>row {r}</t></is></c></row>"#
        ));
    }
    let fixture = Fixture::new().sheet("big", &rows);

    let mut reader = fixture.reader();
    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    let mut last = 0;
    let count = sheet
        .for_each_row(|row| {
            assert_eq!(row.number, last + 1);
            last = row.number;
        })
        .unwrap();
    assert_eq!(count, 80_000);
    assert_eq!(sheet.row_count(), 80_000);
}
