//! Number formats from styles.xml

use std::collections::HashMap;
use std::io::BufRead;

use log::{debug, warn};
use sheetstream_core::NumberFormat;

use crate::error::XlsxResult;
use crate::xml::{XmlEvent, XmlEventRouter};

static GENERAL: NumberFormat = NumberFormat::General;

/// The number format of every cell style, indexed like `<cellXfs>`
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    formats: Vec<NumberFormat>,
}

impl StyleTable {
    /// Parse `<numFmts>` and `<cellXfs>` from a styles part.
    ///
    /// Only the `numFmtId` of each cell format matters here; fonts, fills,
    /// borders and `cellStyleXfs` are ignored.
    pub fn load<R: BufRead>(router: &mut XmlEventRouter<R>) -> XlsxResult<Self> {
        let mut custom: HashMap<u32, String> = HashMap::new();
        let mut xf_ids: Vec<u32> = Vec::new();
        let mut in_cell_xfs = false;

        while let Some(event) = router.next_event()? {
            match event {
                XmlEvent::Open(el) => match el.name.as_str() {
                    "numFmt" => {
                        let id = el.attr("numFmtId").and_then(|v| v.parse::<u32>().ok());
                        match (id, el.attr("formatCode")) {
                            (Some(id), Some(code)) => {
                                custom.insert(id, code.to_string());
                            }
                            _ => warn!("ignoring malformed numFmt {:?}", el.attributes),
                        }
                    }
                    "cellXfs" => in_cell_xfs = true,
                    "xf" if in_cell_xfs => {
                        let id = match el.attr("numFmtId") {
                            None => 0,
                            Some(v) => v.parse::<u32>().unwrap_or_else(|_| {
                                warn!("invalid numFmtId '{}' on cell format {}", v, xf_ids.len());
                                0
                            }),
                        };
                        xf_ids.push(id);
                    }
                    _ => {}
                },
                XmlEvent::Close(name) if name == "cellXfs" => in_cell_xfs = false,
                _ => {}
            }
        }

        let formats = xf_ids
            .into_iter()
            .map(|id| match custom.get(&id) {
                Some(code) => NumberFormat::custom(id, code.clone()),
                None => NumberFormat::from_id(id),
            })
            .collect::<Vec<_>>();

        debug!(
            "loaded {} cell formats ({} custom number formats)",
            formats.len(),
            custom.len()
        );
        Ok(Self { formats })
    }

    /// Build a table directly from formats
    pub fn from_formats(formats: Vec<NumberFormat>) -> Self {
        Self { formats }
    }

    /// Number format of a cell style. Unknown indices resolve to General.
    pub fn resolve(&self, style: u32) -> &NumberFormat {
        self.formats.get(style as usize).unwrap_or(&GENERAL)
    }

    /// Number of cell formats
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether no cell formats were declared
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
