//! Streaming workbook reader
//!
//! [`XlsxStreamReader`] pulls archive members in the order they appear. The
//! workbook, its relationships, styles and shared strings are loaded as they
//! go by; worksheets are handed out in the order the workbook declares them.
//! A worksheet member that shows up before the header parts are complete (or
//! before its turn) is copied to a temporary file and replayed later, so only
//! the header tables and one row are ever held in memory.

mod cell;
mod worksheet;

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, warn};

pub use cell::{resolve_cell, SheetContext};
pub use worksheet::{Rows, WorksheetReader, WorksheetState};

use worksheet::SheetSource;

use crate::error::{XlsxError, XlsxResult};
use crate::options::ReaderOptions;
use crate::shared_strings::SharedStrings;
use crate::styles::StyleTable;
use crate::workbook::{
    part_key, Relationships, WorkbookMetadata, REL_SHARED_STRINGS, REL_STYLES,
    SHARED_STRINGS_PART, STYLES_PART, WORKBOOK_PART, WORKBOOK_RELS_PART,
};
use crate::xml::XmlEventRouter;
use crate::zip_stream::{ZipEntry, ZipStream};

/// Workbook reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Nothing read yet
    Opening,
    /// Collecting workbook, relationships, styles and shared strings
    ReadingHeaderParts,
    /// Handing out worksheets
    EmittingSheets,
    /// Every declared sheet has been handed out
    Ended,
    /// An error was reported; nothing more will be read
    Failed,
}

/// Whether a header part has been dealt with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartStatus {
    #[default]
    Pending,
    Loaded,
    /// Confirmed not to exist in the archive
    Absent,
}

/// Readiness gate over the four header parts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderParts {
    pub workbook: PartStatus,
    pub relationships: PartStatus,
    pub styles: PartStatus,
    pub shared_strings: PartStatus,
}

impl HeaderParts {
    /// All four parts loaded or confirmed absent
    pub fn is_ready(&self) -> bool {
        [
            self.workbook,
            self.relationships,
            self.styles,
            self.shared_strings,
        ]
        .iter()
        .all(|s| *s != PartStatus::Pending)
    }
}

/// What an archive member is, as far as the reader cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
    Workbook,
    Relationships,
    Styles,
    SharedStrings,
    Worksheet,
    Other,
}

/// The next worksheet to hand out
enum Ready {
    /// Replay from a spooled copy
    Spooled(usize, File),
    /// The archive is positioned on the member
    Live(usize),
}

/// Streaming XLSX reader over any sequential byte source.
///
/// ```no_run
/// use sheetstream_xlsx::XlsxStreamReader;
///
/// let mut workbook = XlsxStreamReader::open("report.xlsx")?;
/// while let Some(mut sheet) = workbook.next_worksheet()? {
///     if sheet.name() != "Data" {
///         sheet.skip()?;
///         continue;
///     }
///     sheet.process()?;
///     while let Some(row) = sheet.next_row()? {
///         println!("{}: {:?}", row.number, row.values());
///     }
///     println!("{} rows", sheet.row_count());
/// }
/// # Ok::<(), sheetstream_xlsx::XlsxError>(())
/// ```
pub struct XlsxStreamReader<R: Read> {
    archive: ZipStream<R>,
    options: ReaderOptions,
    state: ReaderState,
    parts: HeaderParts,
    metadata: Option<WorkbookMetadata>,
    relationships: Option<Relationships>,
    shared_strings: SharedStrings,
    styles: StyleTable,
    spooled: HashMap<String, File>,
    seen: HashSet<String>,
    next_sheet: usize,
    archive_done: bool,
    /// Set by a worksheet reader whose rows failed to read
    sheet_failed: Cell<bool>,
}

impl XlsxStreamReader<File> {
    /// Open a workbook file
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> XlsxStreamReader<R> {
    /// Read a workbook with default options
    pub fn new(source: R) -> Self {
        Self::with_options(source, ReaderOptions::default())
    }

    /// Read a workbook with the given options
    pub fn with_options(source: R, options: ReaderOptions) -> Self {
        Self {
            archive: ZipStream::new(source),
            options,
            state: ReaderState::Opening,
            parts: HeaderParts::default(),
            metadata: None,
            relationships: None,
            shared_strings: SharedStrings::default(),
            styles: StyleTable::default(),
            spooled: HashMap::new(),
            seen: HashSet::new(),
            next_sheet: 0,
            archive_done: false,
            sheet_failed: Cell::new(false),
        }
    }

    /// Current state
    pub fn state(&self) -> ReaderState {
        if self.sheet_failed.get() {
            return ReaderState::Failed;
        }
        self.state
    }

    /// Options in use
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Header part progress
    pub fn header_parts(&self) -> HeaderParts {
        self.parts
    }

    /// Sheet list and date system, once the workbook part has been read
    pub fn metadata(&self) -> Option<&WorkbookMetadata> {
        self.metadata.as_ref()
    }

    /// The shared string table (empty until loaded)
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// The style table (empty until loaded)
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Next worksheet in workbook order.
    ///
    /// `Ok(None)` once every sheet has been handed out. An error is returned
    /// once; afterwards the reader is [`ReaderState::Failed`] and yields
    /// `Ok(None)`. The same holds for an error returned by a worksheet's
    /// rows. A worksheet that is dropped without being processed is skipped.
    pub fn next_worksheet(&mut self) -> XlsxResult<Option<WorksheetReader<'_, R>>> {
        if self.sheet_failed.get() && self.state != ReaderState::Failed {
            debug!("workbook failed while reading a worksheet");
            self.state = ReaderState::Failed;
        }
        if matches!(self.state, ReaderState::Ended | ReaderState::Failed) {
            return Ok(None);
        }

        let ready = match self.advance() {
            Ok(Some(ready)) => ready,
            Ok(None) => {
                debug!("workbook ended after {} sheets", self.next_sheet);
                self.state = ReaderState::Ended;
                return Ok(None);
            }
            Err(e) => {
                debug!("workbook failed: {}", e);
                self.state = ReaderState::Failed;
                return Err(e);
            }
        };

        let (index, source) = match ready {
            Ready::Spooled(index, file) => (index, SheetSource::Spooled(file)),
            Ready::Live(index) => match self.archive.current_entry() {
                Some(entry) => (index, SheetSource::Archive(entry)),
                None => {
                    self.state = ReaderState::Failed;
                    return Err(XlsxError::InvalidState(
                        "archive is not positioned on a worksheet".into(),
                    ));
                }
            },
        };

        let metadata = match self.metadata.as_ref() {
            Some(metadata) => metadata,
            None => {
                self.state = ReaderState::Failed;
                return Err(XlsxError::MissingPart(WORKBOOK_PART.into()));
            }
        };
        let sheet = metadata.sheets[index].clone();
        debug!("emitting worksheet '{}' ({})", sheet.name, sheet.path.as_deref().unwrap_or("?"));

        let ctx = SheetContext {
            shared_strings: &self.shared_strings,
            styles: &self.styles,
            date_system: metadata.date_system,
            format_values: self.options.format_values,
        };
        Ok(Some(WorksheetReader::new(
            sheet,
            ctx,
            source,
            self.options.trim,
            &self.sheet_failed,
        )))
    }

    /// Pull members until a worksheet can be handed out
    fn advance(&mut self) -> XlsxResult<Option<Ready>> {
        let Self {
            archive,
            options,
            state,
            parts,
            metadata,
            relationships,
            shared_strings,
            styles,
            spooled,
            seen,
            next_sheet,
            archive_done,
            ..
        } = self;

        if *state == ReaderState::Opening {
            *state = ReaderState::ReadingHeaderParts;
        }

        loop {
            if parts.is_ready() {
                if *state == ReaderState::ReadingHeaderParts {
                    debug!("header parts ready: {:?}", parts);
                    *state = ReaderState::EmittingSheets;
                }
                let Some(metadata) = metadata.as_ref() else {
                    return Err(XlsxError::MissingPart(WORKBOOK_PART.into()));
                };

                while let Some(sheet) = metadata.sheets.get(*next_sheet) {
                    let index = *next_sheet;
                    let Some(path) = sheet.path.as_deref() else {
                        warn!("sheet '{}' has no worksheet part; skipping", sheet.name);
                        *next_sheet += 1;
                        continue;
                    };
                    let key = part_key(path);
                    if let Some(file) = spooled.remove(&key) {
                        *next_sheet += 1;
                        return Ok(Some(Ready::Spooled(index, file)));
                    }
                    if seen.contains(&key) || *archive_done {
                        warn!("worksheet '{}' ({}) not found in archive; skipping", sheet.name, path);
                        *next_sheet += 1;
                        continue;
                    }
                    break;
                }
                if *next_sheet >= metadata.sheets.len() {
                    return Ok(None);
                }
            }

            if *archive_done {
                confirm_absent(parts)?;
                continue;
            }

            let Some(mut entry) = archive.next_entry()? else {
                debug!("end of archive after {} members", archive.members_seen());
                *archive_done = true;
                continue;
            };
            if entry.header().is_dir() {
                continue;
            }

            let key = part_key(entry.name());
            match classify(&key, relationships.as_ref()) {
                Member::Workbook if parts.workbook == PartStatus::Pending => {
                    let mut loaded = WorkbookMetadata::load(&mut router(entry, true)?)?;
                    if let Some(rels) = relationships.as_ref() {
                        loaded.bind(rels);
                    }
                    *metadata = Some(loaded);
                    parts.workbook = PartStatus::Loaded;
                }
                Member::Relationships if parts.relationships == PartStatus::Pending => {
                    let rels = Relationships::load(&mut router(entry, true)?, "xl")?;
                    if parts.styles == PartStatus::Pending && rels.find_by_type(REL_STYLES).is_none() {
                        debug!("workbook has no styles part");
                        parts.styles = PartStatus::Absent;
                    }
                    if parts.shared_strings == PartStatus::Pending
                        && rels.find_by_type(REL_SHARED_STRINGS).is_none()
                    {
                        debug!("workbook has no shared strings part");
                        parts.shared_strings = PartStatus::Absent;
                    }
                    if let Some(metadata) = metadata.as_mut() {
                        metadata.bind(&rels);
                    }
                    spooled.retain(|name, _| rels.is_worksheet(name));
                    *relationships = Some(rels);
                    parts.relationships = PartStatus::Loaded;
                }
                Member::Styles if parts.styles == PartStatus::Pending => {
                    *styles = StyleTable::load(&mut router(entry, true)?)?;
                    parts.styles = PartStatus::Loaded;
                }
                Member::SharedStrings if parts.shared_strings == PartStatus::Pending => {
                    *shared_strings = SharedStrings::load(
                        &mut router(entry, options.trim)?,
                        options.rich_text_runs,
                    )?;
                    parts.shared_strings = PartStatus::Loaded;
                }
                Member::Worksheet => {
                    seen.insert(key.clone());
                    let position = metadata.as_ref().filter(|_| parts.is_ready()).map(|m| {
                        m.sheets
                            .iter()
                            .position(|s| s.path.as_deref().map(part_key).as_deref() == Some(key.as_str()))
                    });
                    match position {
                        Some(Some(index)) if index == *next_sheet => {
                            entry.ensure_supported()?;
                            *next_sheet += 1;
                            return Ok(Some(Ready::Live(index)));
                        }
                        Some(Some(index)) if index < *next_sheet => {
                            debug!("'{}' was already handed out; skipping", key);
                            entry.skip()?;
                        }
                        Some(None) => {
                            debug!("'{}' is not a declared sheet; skipping", key);
                            entry.skip()?;
                        }
                        _ => {
                            let file = spool(&mut entry, options.spool_dir.as_deref())?;
                            spooled.insert(key, file);
                        }
                    }
                }
                _ => {
                    debug!("skipping member '{}'", key);
                    entry.skip()?;
                }
            }
        }
    }
}

/// Resolve pending header parts once the archive has no more members
fn confirm_absent(parts: &mut HeaderParts) -> XlsxResult<()> {
    if parts.workbook == PartStatus::Pending {
        return Err(XlsxError::MissingPart(WORKBOOK_PART.into()));
    }
    if parts.relationships == PartStatus::Pending {
        return Err(XlsxError::MissingPart(WORKBOOK_RELS_PART.into()));
    }
    if parts.styles == PartStatus::Pending {
        debug!("no styles part in archive");
        parts.styles = PartStatus::Absent;
    }
    if parts.shared_strings == PartStatus::Pending {
        debug!("no shared strings part in archive");
        parts.shared_strings = PartStatus::Absent;
    }
    Ok(())
}

fn classify(key: &str, relationships: Option<&Relationships>) -> Member {
    if key == WORKBOOK_PART {
        return Member::Workbook;
    }
    if key == WORKBOOK_RELS_PART {
        return Member::Relationships;
    }

    let target_of = |suffix: &str, default: &str| match relationships {
        Some(rels) => rels.find_by_type(suffix).map(|r| part_key(&r.target)),
        None => Some(part_key(default)),
    };
    if target_of(REL_STYLES, STYLES_PART).as_deref() == Some(key) {
        return Member::Styles;
    }
    if target_of(REL_SHARED_STRINGS, SHARED_STRINGS_PART).as_deref() == Some(key) {
        return Member::SharedStrings;
    }

    let is_worksheet = match relationships {
        Some(rels) => rels.is_worksheet(key),
        // until relationships arrive, anything that may be a worksheet is kept
        None => {
            key.starts_with("xl/")
                && key.ends_with(".xml")
                && !key.contains("/_rels/")
                && !key.starts_with("xl/theme/")
        }
    };
    if is_worksheet {
        Member::Worksheet
    } else {
        Member::Other
    }
}

fn router<R: Read>(
    entry: ZipEntry<'_, R>,
    trim: bool,
) -> XlsxResult<XmlEventRouter<BufReader<ZipEntry<'_, R>>>> {
    entry.ensure_supported()?;
    Ok(XmlEventRouter::new(BufReader::new(entry), trim))
}

/// Copy a member's decompressed bytes to an anonymous temporary file
fn spool<R: Read>(entry: &mut ZipEntry<'_, R>, dir: Option<&Path>) -> XlsxResult<File> {
    entry.ensure_supported()?;
    let mut file = match dir {
        Some(dir) => tempfile::tempfile_in(dir)?,
        None => tempfile::tempfile()?,
    };
    let bytes = io::copy(entry, &mut file)?;
    file.seek(SeekFrom::Start(0))?;
    debug!("spooled '{}' ({} bytes)", entry.name(), bytes);
    Ok(file)
}
