//! Worksheet reader state machine

use std::cell::Cell as Flag;
use std::fs::File;
use std::io::{self, BufReader, Read};

use log::{debug, trace};
use sheetstream_core::{Cell, CellAddress, CellType, Row};

use super::cell::{resolve_cell, SheetContext};
use crate::error::{XlsxError, XlsxResult};
use crate::workbook::{SheetDescriptor, SheetVisibility};
use crate::xml::{Element, XmlEvent, XmlEventRouter};
use crate::zip_stream::ZipEntry;

/// Processing state of a worksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksheetState {
    /// Waiting for [`WorksheetReader::process`] or [`WorksheetReader::skip`]
    Unstarted,
    /// Bytes are being discarded
    Skipped,
    /// Rows are being parsed
    Processing,
    /// All rows read, or the sheet was skipped
    Ended,
}

/// Where the worksheet XML comes from
pub(crate) enum SheetSource<'a, R: Read> {
    /// Straight from the archive, inflated on demand
    Archive(ZipEntry<'a, R>),
    /// A member that arrived early and was copied to a temporary file
    Spooled(File),
}

impl<R: Read> SheetSource<'_, R> {
    fn discard(self) -> XlsxResult<()> {
        match self {
            SheetSource::Archive(entry) => entry.skip(),
            SheetSource::Spooled(_) => Ok(()),
        }
    }
}

impl<R: Read> Read for SheetSource<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SheetSource::Archive(entry) => entry.read(buf),
            SheetSource::Spooled(file) => file.read(buf),
        }
    }
}

/// Cell being assembled between `<c>` and `</c>`
#[derive(Debug)]
struct PendingCell {
    address: CellAddress,
    reference: Option<String>,
    cell_type: CellType,
    style: u32,
    raw: String,
    has_value: bool,
    formula: Option<String>,
}

#[derive(Debug, Default)]
struct Assembly {
    row: Option<Row>,
    cell: Option<PendingCell>,
    last_row: u32,
    last_col: u32,
    in_value: bool,
    in_formula: bool,
    in_inline: bool,
    in_text: bool,
    phonetic_depth: usize,
}

/// Reads the rows of one worksheet.
///
/// Obtained from [`XlsxStreamReader::next_worksheet`](super::XlsxStreamReader::next_worksheet).
/// Call [`process`](Self::process) and then pull rows, or call
/// [`skip`](Self::skip). Dropping the reader without either also skips it.
///
/// A read error ends the sheet and fails the whole workbook: the owning
/// reader hands out no further sheets.
pub struct WorksheetReader<'a, R: Read> {
    sheet: SheetDescriptor,
    ctx: SheetContext<'a>,
    source: Option<SheetSource<'a, R>>,
    router: Option<XmlEventRouter<BufReader<SheetSource<'a, R>>>>,
    trim: bool,
    state: WorksheetState,
    assembly: Assembly,
    row_count: usize,
    dimension: Option<String>,
    failed: &'a Flag<bool>,
}

impl<'a, R: Read> WorksheetReader<'a, R> {
    pub(crate) fn new(
        sheet: SheetDescriptor,
        ctx: SheetContext<'a>,
        source: SheetSource<'a, R>,
        trim: bool,
        failed: &'a Flag<bool>,
    ) -> Self {
        Self {
            sheet,
            ctx,
            source: Some(source),
            router: None,
            trim,
            state: WorksheetState::Unstarted,
            assembly: Assembly::default(),
            row_count: 0,
            dimension: None,
            failed,
        }
    }

    /// Sheet name as declared in the workbook
    pub fn name(&self) -> &str {
        &self.sheet.name
    }

    /// `sheetId` from the workbook
    pub fn sheet_id(&self) -> u32 {
        self.sheet.sheet_id
    }

    /// Archive member the sheet is read from
    pub fn path(&self) -> &str {
        self.sheet.path.as_deref().unwrap_or_default()
    }

    /// Sheet visibility
    pub fn visibility(&self) -> SheetVisibility {
        self.sheet.visibility
    }

    /// Current state
    pub fn state(&self) -> WorksheetState {
        self.state
    }

    /// Number of data-bearing rows emitted so far; final once the state is
    /// [`WorksheetState::Ended`]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// The `<dimension ref>` of the sheet, once parsing has passed it
    pub fn dimension(&self) -> Option<&str> {
        self.dimension.as_deref()
    }

    /// Start parsing rows
    pub fn process(&mut self) -> XlsxResult<()> {
        if self.state != WorksheetState::Unstarted {
            return Err(XlsxError::InvalidState(format!(
                "worksheet '{}' cannot be processed while {:?}",
                self.sheet.name, self.state
            )));
        }
        let source = self.source.take().ok_or_else(|| {
            XlsxError::InvalidState(format!("worksheet '{}' has no source", self.sheet.name))
        })?;
        debug!("processing worksheet '{}'", self.sheet.name);
        self.router = Some(XmlEventRouter::new(BufReader::new(source), self.trim));
        self.state = WorksheetState::Processing;
        Ok(())
    }

    /// Discard the sheet without parsing it.
    ///
    /// While processing, the rest of the sheet is abandoned. Skipping an
    /// ended sheet does nothing.
    pub fn skip(&mut self) -> XlsxResult<()> {
        match self.state {
            WorksheetState::Unstarted => {
                self.state = WorksheetState::Skipped;
                debug!("skipping worksheet '{}'", self.sheet.name);
                if let Some(source) = self.source.take() {
                    if let Err(e) = source.discard() {
                        self.failed.set(true);
                        self.state = WorksheetState::Ended;
                        return Err(e);
                    }
                }
            }
            WorksheetState::Processing => {
                debug!("abandoning worksheet '{}' after {} rows", self.sheet.name, self.row_count);
                self.router = None;
            }
            WorksheetState::Skipped | WorksheetState::Ended => {}
        }
        self.state = WorksheetState::Ended;
        Ok(())
    }

    /// Next data-bearing row, or `None` at the end of the sheet
    pub fn next_row(&mut self) -> XlsxResult<Option<Row>> {
        match self.state {
            WorksheetState::Unstarted => Err(XlsxError::InvalidState(format!(
                "worksheet '{}' must be processed before reading rows",
                self.sheet.name
            ))),
            WorksheetState::Skipped | WorksheetState::Ended => Ok(None),
            WorksheetState::Processing => match self.read_row() {
                Ok(Some(row)) => Ok(Some(row)),
                Ok(None) => {
                    self.end();
                    Ok(None)
                }
                Err(e) => {
                    debug!("worksheet '{}' failed: {}", self.sheet.name, e);
                    self.failed.set(true);
                    self.end();
                    Err(e)
                }
            },
        }
    }

    /// Iterate over the remaining rows
    pub fn rows(&mut self) -> Rows<'_, 'a, R> {
        Rows {
            reader: self,
            done: false,
        }
    }

    /// Process the sheet, calling `f` for every row. Returns the row count.
    pub fn for_each_row<F>(&mut self, mut f: F) -> XlsxResult<usize>
    where
        F: FnMut(Row),
    {
        if self.state == WorksheetState::Unstarted {
            self.process()?;
        }
        while let Some(row) = self.next_row()? {
            f(row);
        }
        Ok(self.row_count)
    }

    fn end(&mut self) {
        self.router = None;
        self.assembly = Assembly::default();
        self.state = WorksheetState::Ended;
        debug!(
            "worksheet '{}' ended with {} rows",
            self.sheet.name, self.row_count
        );
    }

    fn read_row(&mut self) -> XlsxResult<Option<Row>> {
        let Self {
            sheet,
            ctx,
            router,
            assembly,
            row_count,
            dimension,
            ..
        } = self;
        let Some(router) = router.as_mut() else {
            return Ok(None);
        };

        while let Some(event) = router.next_event()? {
            match event {
                XmlEvent::Open(el) => open_element(assembly, dimension, el)?,
                XmlEvent::Text(text) => {
                    let Some(cell) = assembly.cell.as_mut() else {
                        continue;
                    };
                    if assembly.in_value || assembly.in_text {
                        cell.raw.push_str(&text);
                        cell.has_value = true;
                    } else if assembly.in_formula {
                        cell.formula.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                XmlEvent::Close(name) => match name.as_str() {
                    "v" => assembly.in_value = false,
                    "f" => assembly.in_formula = false,
                    "t" => assembly.in_text = false,
                    "is" => assembly.in_inline = false,
                    "rPh" => assembly.phonetic_depth = assembly.phonetic_depth.saturating_sub(1),
                    "c" => {
                        if let Some(pending) = assembly.cell.take() {
                            let cell = finish_cell(pending, ctx)?;
                            if let (Some(cell), Some(row)) = (cell, assembly.row.as_mut()) {
                                row.cells.push(cell);
                            }
                        }
                    }
                    "row" => {
                        let Some(row) = assembly.row.take() else {
                            continue;
                        };
                        if row.has_values() {
                            *row_count += 1;
                            trace!(
                                "'{}' row {} ({} cells)",
                                sheet.name,
                                row.number,
                                row.cells.len()
                            );
                            return Ok(Some(row));
                        }
                        trace!("'{}' row {} has no data", sheet.name, row.number);
                    }
                    _ => {}
                },
            }
        }
        Ok(None)
    }
}

fn open_element(
    assembly: &mut Assembly,
    dimension: &mut Option<String>,
    el: Element,
) -> XlsxResult<()> {
    match el.name.as_str() {
        "dimension" => *dimension = el.attr("ref").map(str::to_string),
        "row" => {
            let number = el
                .attr("r")
                .and_then(|r| r.trim().parse::<u32>().ok())
                .unwrap_or(assembly.last_row + 1);
            assembly.last_row = number;
            assembly.last_col = 0;
            let mut row = Row::new(number);
            row.attributes = el.attributes;
            assembly.row = Some(row);
        }
        "c" => {
            let row = assembly.last_row.max(1);
            let reference = el.attr("r").map(str::to_string);
            let col = match reference.as_deref() {
                Some(r) => CellAddress::column_of(r)?,
                None => assembly.last_col + 1,
            };
            assembly.last_col = col;
            assembly.cell = Some(PendingCell {
                address: CellAddress::new(row, col),
                reference,
                cell_type: CellType::from_code(el.attr("t").unwrap_or_default()),
                style: el.attr("s").and_then(|s| s.parse().ok()).unwrap_or(0),
                raw: String::new(),
                has_value: false,
                formula: None,
            });
        }
        "v" => assembly.in_value = true,
        "f" => assembly.in_formula = true,
        "is" => assembly.in_inline = true,
        "rPh" => assembly.phonetic_depth += 1,
        "t" if assembly.in_inline && assembly.phonetic_depth == 0 => assembly.in_text = true,
        _ => {}
    }
    Ok(())
}

fn finish_cell(pending: PendingCell, ctx: &SheetContext<'_>) -> XlsxResult<Option<Cell>> {
    if !pending.has_value {
        return Ok(None);
    }
    let reference = pending
        .reference
        .unwrap_or_else(|| pending.address.to_a1_string());
    let format = ctx.styles.resolve(pending.style);
    let value = resolve_cell(&pending.raw, &pending.cell_type, &reference, format, ctx)?;
    Ok(Some(Cell {
        address: pending.address,
        raw: pending.raw,
        cell_type: pending.cell_type,
        style: pending.style,
        formula: pending.formula,
        value,
    }))
}

/// Iterator over the rows of a processed worksheet.
///
/// Stops after the first error.
pub struct Rows<'r, 'a, R: Read> {
    reader: &'r mut WorksheetReader<'a, R>,
    done: bool,
}

impl<R: Read> Iterator for Rows<'_, '_, R> {
    type Item = XlsxResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
