//! Reader configuration

use std::path::PathBuf;

/// Options controlling how a workbook stream is read.
///
/// ```
/// use sheetstream_xlsx::ReaderOptions;
///
/// let options = ReaderOptions::new().trim(false).format_values(false);
/// assert!(!options.trim);
/// assert!(!options.rich_text_runs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Drop whitespace-only text and trim text boundaries in parsed XML
    pub trim: bool,
    /// Render numeric cells through their number format
    pub format_values: bool,
    /// Keep per-run formatting for rich shared strings
    pub rich_text_runs: bool,
    /// Directory for spooled worksheet parts (system temp dir when `None`)
    pub spool_dir: Option<PathBuf>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            trim: true,
            format_values: true,
            rich_text_runs: false,
            spool_dir: None,
        }
    }
}

impl ReaderOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the XML trim mode
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Enable or disable number-format rendering
    pub fn format_values(mut self, format_values: bool) -> Self {
        self.format_values = format_values;
        self
    }

    /// Keep rich text run metadata in the shared string table
    pub fn rich_text_runs(mut self, rich_text_runs: bool) -> Self {
        self.rich_text_runs = rich_text_runs;
        self
    }

    /// Spool early worksheet parts into `dir`
    pub fn spool_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }
}
