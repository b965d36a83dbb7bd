//! Container-level failures and isolation between readers.

use crate::{read_all, zip_members, Fixture, Layout};
use pretty_assertions::assert_eq;
use sheetstream_xlsx::{ErrorKind, ReaderState, XlsxError, XlsxStreamReader};

#[test]
fn test_not_an_archive() {
    let mut reader = XlsxStreamReader::new(&b"i am not an xlsx file, just text"[..]);
    let err = match reader.next_worksheet() {
        Err(e) => e,
        Ok(_) => panic!("expected an error"),
    };
    assert_eq!(err.to_string(), "invalid signature: 0x6d612069");
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(reader.state(), ReaderState::Failed);
    // reported once
    assert!(reader.next_worksheet().unwrap().is_none());
}

#[test]
fn test_missing_workbook_part() {
    let bytes = zip_members(&[(
        "xl/worksheets/sheet1.xml".to_string(),
        "<worksheet><sheetData/></worksheet>".to_string(),
    )]);
    let mut reader = XlsxStreamReader::new(&bytes[..]);
    let err = match reader.next_worksheet() {
        Err(e) => e,
        Ok(_) => panic!("expected an error"),
    };
    assert!(matches!(err, XlsxError::MissingPart(ref part) if part == "xl/workbook.xml"));
}

#[test]
fn test_truncated_archive() {
    // the worksheet dominates the archive, so the cut lands inside it
    let rows: String = (1..=5000u32)
        .map(|r| format!(r#"<row r="{r}"><c r="A{r}"><v>{}</v></c></row>"#, r * 7919 % 100_003))
        .collect();
    let bytes = Fixture::new().sheet("Sheet1", &rows).build();
    let truncated = &bytes[..bytes.len() / 2];

    let mut reader = XlsxStreamReader::new(truncated);
    let result = read_all(&mut reader);
    let err = result.err().expect("truncated input should fail");
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn test_lookup_error_is_fatal() {
    let fixture = Fixture::new()
        .layout(Layout::TablesFirst)
        .shared_strings(&["only"])
        .sheet("Sheet1", r#"<row r="1"><c r="A1" t="s"><v>5</v></c></row>"#)
        .sheet("Sheet2", r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);
    let mut reader = fixture.reader();

    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    sheet.process().unwrap();
    let err = sheet.next_row().err().expect("bad index should fail");
    assert_eq!(err.kind(), ErrorKind::Lookup);
    assert_eq!(err.to_string(), "Shared string index 5 out of bounds (1 strings)");
    drop(sheet);

    // Sheet2 is valid but is never handed out
    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(reader.next_worksheet().unwrap().is_none());
    assert_eq!(reader.state(), ReaderState::Failed);
}

#[test]
fn test_invalid_number_is_a_value_error() {
    let fixture = Fixture::new()
        .sheet("Sheet1", r#"<row r="1"><c r="B3"><v>12,5</v></c></row>"#)
        .sheet("Sheet2", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#);
    let mut reader = fixture.reader();
    let err = read_all(&mut reader).err().expect("should fail");
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(err.to_string(), "Invalid number '12,5' in cell B3");

    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(reader.next_worksheet().unwrap().is_none());
}

#[test]
fn test_error_after_rows_fails_workbook() {
    let fixture = Fixture::new()
        .layout(Layout::SheetsFirst)
        .shared_strings(&["a"])
        .sheet(
            "Sheet1",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row><row r="2"><c r="A2" t="s"><v>x</v></c></row>"#,
        )
        .sheet("Sheet2", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#);
    let mut reader = fixture.reader();

    let mut sheet = reader.next_worksheet().unwrap().unwrap();
    sheet.process().unwrap();
    let results: Vec<_> = sheet.rows().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::Value);
    drop(sheet);

    assert!(reader.next_worksheet().unwrap().is_none());
    assert_eq!(reader.state(), ReaderState::Failed);
}

#[test]
fn test_two_workbooks_on_two_threads() {
    let import = Fixture::new()
        .styles(&[(164, "dd/mm/yyyy")], &[Some(0), Some(164)])
        .shared_strings(&["date"])
        .sheet("import", r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row><row r="2"><c r="A2" s="1"><v>31682</v></c></row>"#)
        .build();
    let two_sheets = Fixture::new()
        .shared_strings(&["x", "y", "z"])
        .sheet("one", r#"<row r="1"><c r="A1" t="s"><v>2</v></c></row>"#)
        .sheet("two", r#"<row r="1"><c r="A1" t="s"><v>1</v></c></row><row r="2"><c r="A2"><v>31682</v></c></row>"#)
        .build();

    let handles: Vec<_> = [import, two_sheets]
        .into_iter()
        .map(|bytes| {
            std::thread::spawn(move || {
                let mut reader = XlsxStreamReader::new(std::io::Cursor::new(bytes));
                read_all(&mut reader)
                    .unwrap()
                    .into_iter()
                    .map(|s| {
                        let values: Vec<String> = s
                            .rows
                            .iter()
                            .flat_map(|r| r.cells.iter().map(|c| c.value.to_string()))
                            .collect();
                        (s.name, s.row_count, values)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results[0],
        vec![(
            "import".to_string(),
            2,
            vec!["date".to_string(), "27/09/1986".to_string()]
        )]
    );
    assert_eq!(
        results[1],
        vec![
            ("one".to_string(), 1, vec!["z".to_string()]),
            ("two".to_string(), 2, vec!["y".to_string(), "31682".to_string()]),
        ]
    );
}
