//! Shared string table (`xl/sharedStrings.xml`)

use std::borrow::Cow;
use std::io::BufRead;

use log::debug;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{Element, XmlEvent, XmlEventRouter};

/// Upper bound on pre-allocation from a declared `uniqueCount`
const MAX_PREALLOCATED: usize = 1 << 16;

/// Formatting of one run inside a rich shared string
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichRun {
    /// Run text
    pub text: String,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
    /// Underlined
    pub underline: bool,
    /// Font name (`rFont`)
    pub font: Option<String>,
    /// Font size in points
    pub size: Option<f64>,
    /// ARGB colour
    pub color: Option<String>,
}

/// Dense, index-addressed table of workbook strings
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
    runs: Vec<Vec<RichRun>>,
}

impl SharedStrings {
    /// Parse the whole shared-strings part.
    ///
    /// Each `<si>` contributes the concatenation of its `<t>` texts; phonetic
    /// guides (`<rPh>`) are left out. With `rich_runs`, per-run formatting is
    /// kept and available through [`runs`](Self::runs).
    pub fn load<R: BufRead>(router: &mut XmlEventRouter<R>, rich_runs: bool) -> XlsxResult<Self> {
        let mut table = SharedStrings::default();

        let mut current = String::new();
        let mut current_runs: Vec<RichRun> = Vec::new();
        let mut run: Option<RichRun> = None;
        let mut in_si = false;
        let mut in_t = false;
        let mut in_rpr = false;
        let mut phonetic_depth = 0usize;

        while let Some(event) = router.next_event()? {
            match event {
                XmlEvent::Open(el) => match el.name.as_str() {
                    "sst" => {
                        if let Some(n) = el.attr("uniqueCount").and_then(|v| v.parse::<usize>().ok()) {
                            table.strings.reserve(n.min(MAX_PREALLOCATED));
                        }
                    }
                    "si" => {
                        in_si = true;
                        current.clear();
                        current_runs.clear();
                    }
                    "rPh" => phonetic_depth += 1,
                    "r" if in_si && rich_runs && phonetic_depth == 0 => {
                        run = Some(RichRun::default());
                    }
                    "rPr" => in_rpr = true,
                    "t" if in_si && phonetic_depth == 0 => in_t = true,
                    _ if in_rpr => {
                        if let Some(run) = run.as_mut() {
                            apply_run_property(run, &el);
                        }
                    }
                    _ => {}
                },
                XmlEvent::Text(text) if in_t => {
                    current.push_str(&text);
                    if let Some(run) = run.as_mut() {
                        run.text.push_str(&text);
                    }
                }
                XmlEvent::Text(_) => {}
                XmlEvent::Close(name) => match name.as_str() {
                    "t" => in_t = false,
                    "rPr" => in_rpr = false,
                    "rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    "r" => {
                        if let Some(mut done) = run.take() {
                            done.text = decode_escapes(&done.text).into_owned();
                            current_runs.push(done);
                        }
                    }
                    "si" => {
                        in_si = false;
                        table.strings.push(decode_escapes(&current).into_owned());
                        if rich_runs {
                            table.runs.push(std::mem::take(&mut current_runs));
                        }
                    }
                    _ => {}
                },
            }
        }

        debug!("loaded {} shared strings", table.strings.len());
        Ok(table)
    }

    /// Build a table from plain strings
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strings: strings.into_iter().map(Into::into).collect(),
            runs: Vec::new(),
        }
    }

    /// Look up a string by index
    pub fn get(&self, index: usize) -> XlsxResult<&str> {
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or(XlsxError::SharedStringIndex {
                index,
                len: self.strings.len(),
            })
    }

    /// Rich runs of a string; empty for plain strings or when runs were not kept
    pub fn runs(&self, index: usize) -> &[RichRun] {
        self.runs.get(index).map_or(&[][..], Vec::as_slice)
    }

    /// Number of strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

fn apply_run_property(run: &mut RichRun, el: &Element) {
    // `<b/>` means on; `<b val="0"/>` means off
    let on = !matches!(el.attr("val"), Some("0") | Some("false"));
    match el.name.as_str() {
        "b" => run.bold = on,
        "i" => run.italic = on,
        "u" => run.underline = !matches!(el.attr("val"), Some("none")),
        "rFont" => run.font = el.attr("val").map(str::to_string),
        "sz" => run.size = el.attr("val").and_then(|v| v.parse().ok()),
        "color" => run.color = el.attr("rgb").map(str::to_string),
        _ => {}
    }
}

/// Decode `_xHHHH_` escapes (e.g. `_x000d_` for CR, `_x005f_` for `_`).
///
/// Sequences that are not exactly four hex digits between `_x` and `_` are
/// kept verbatim.
pub(crate) fn decode_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match escaped_char(candidate) {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn escaped_char(candidate: &str) -> Option<char> {
    let bytes = candidate.as_bytes();
    if bytes.len() < 7 || bytes[6] != b'_' {
        return None;
    }
    let hex = candidate.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    char::from_u32(u32::from_str_radix(hex, 16).ok()?)
}
