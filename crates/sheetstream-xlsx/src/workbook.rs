//! Workbook metadata and relationships
//!
//! `xl/workbook.xml` declares the sheets in display order and the date
//! system; `xl/_rels/workbook.xml.rels` maps each sheet's relationship id to
//! the archive member that holds it.

use std::io::BufRead;

use log::{debug, warn};
use sheetstream_core::DateSystem;

use crate::error::XlsxResult;
use crate::xml::{XmlEvent, XmlEventRouter};

/// Relationship type suffix of a worksheet part
pub const REL_WORKSHEET: &str = "/worksheet";
/// Relationship type suffix of the styles part
pub const REL_STYLES: &str = "/styles";
/// Relationship type suffix of the shared strings part
pub const REL_SHARED_STRINGS: &str = "/sharedStrings";

/// Canonical location of the workbook part
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
/// Canonical location of the workbook relationships part
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
/// Canonical location of the styles part
pub const STYLES_PART: &str = "xl/styles.xml";
/// Canonical location of the shared strings part
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Sheet visibility (`state` attribute of `<sheet>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

impl SheetVisibility {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("hidden") => SheetVisibility::Hidden,
            Some("veryHidden") => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }
}

/// One `<sheet>` entry of the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDescriptor {
    /// Sheet name, case preserved
    pub name: String,
    /// `sheetId` attribute
    pub sheet_id: u32,
    /// Relationship id (`r:id`)
    pub relationship_id: String,
    /// Visibility
    pub visibility: SheetVisibility,
    /// Archive member holding the worksheet, once relationships are known.
    ///
    /// Stays `None` for sheets that are not worksheets (chartsheets, dialog
    /// sheets) or whose relationship is missing.
    pub path: Option<String>,
}

/// Sheet list and settings from `xl/workbook.xml`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkbookMetadata {
    /// Sheets in declared order
    pub sheets: Vec<SheetDescriptor>,
    /// Date epoch (`<workbookPr date1904>`)
    pub date_system: DateSystem,
}

impl WorkbookMetadata {
    /// Parse the workbook part
    pub fn load<R: BufRead>(router: &mut XmlEventRouter<R>) -> XlsxResult<Self> {
        let mut metadata = WorkbookMetadata::default();

        while let Some(event) = router.next_event()? {
            let XmlEvent::Open(el) = event else {
                continue;
            };
            match el.name.as_str() {
                "workbookPr" => {
                    metadata.date_system = DateSystem::from_date1904(el.flag("date1904"));
                }
                "sheet" => {
                    let (Some(name), Some(rel_id)) = (el.attr("name"), el.attr("id")) else {
                        warn!("ignoring sheet without name or relationship id: {:?}", el.attributes);
                        continue;
                    };
                    metadata.sheets.push(SheetDescriptor {
                        name: name.to_string(),
                        sheet_id: el.attr("sheetId").and_then(|v| v.parse().ok()).unwrap_or(0),
                        relationship_id: rel_id.to_string(),
                        visibility: SheetVisibility::from_attr(el.attr("state")),
                        path: None,
                    });
                }
                _ => {}
            }
        }

        debug!(
            "workbook declares {} sheets ({:?})",
            metadata.sheets.len(),
            metadata.date_system
        );
        Ok(metadata)
    }

    /// Look up a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&SheetDescriptor> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names in declared order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Fill in each sheet's member path from the relationships
    pub fn bind(&mut self, relationships: &Relationships) {
        for sheet in &mut self.sheets {
            sheet.path = match relationships.get(&sheet.relationship_id) {
                Some(rel) if rel.is_type(REL_WORKSHEET) => Some(rel.target.clone()),
                Some(rel) => {
                    debug!("sheet '{}' is a {} part, not a worksheet", sheet.name, rel.rel_type);
                    None
                }
                None => {
                    warn!(
                        "sheet '{}' refers to unknown relationship '{}'",
                        sheet.name, sheet.relationship_id
                    );
                    None
                }
            };
        }
    }
}

/// A package relationship with its target resolved to an archive path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Archive member path, without a leading slash
    pub target: String,
}

impl Relationship {
    /// Whether the relationship type ends with `suffix`
    pub fn is_type(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// Relationships of one part
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part. Targets are resolved against `base_dir`, the
    /// directory of the part the relationships belong to.
    pub fn load<R: BufRead>(router: &mut XmlEventRouter<R>, base_dir: &str) -> XlsxResult<Self> {
        let mut items = Vec::new();

        while let Some(event) = router.next_event()? {
            let XmlEvent::Open(el) = event else {
                continue;
            };
            if el.name != "Relationship" {
                continue;
            }
            if el.attr("TargetMode") == Some("External") {
                continue;
            }
            if let (Some(id), Some(rel_type), Some(target)) =
                (el.attr("Id"), el.attr("Type"), el.attr("Target"))
            {
                items.push(Relationship {
                    id: id.to_string(),
                    rel_type: rel_type.to_string(),
                    target: resolve_target(base_dir, target),
                });
            }
        }

        debug!("loaded {} relationships for '{}'", items.len(), base_dir);
        Ok(Self { items })
    }

    /// Look up by relationship id
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship whose type ends with `suffix`
    pub fn find_by_type(&self, suffix: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.is_type(suffix))
    }

    /// Whether `path` is the target of a worksheet relationship
    /// (compared with [`part_key`])
    pub fn is_worksheet(&self, path: &str) -> bool {
        let key = part_key(path);
        self.items
            .iter()
            .any(|r| r.is_type(REL_WORKSHEET) && part_key(&r.target) == key)
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no relationships
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (`/xl/...`) are taken from the package root; `.` and `..`
/// segments are collapsed.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base_dir.is_empty() => target,
        None => format!("{}/{}", base_dir.trim_end_matches('/'), target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Key used to compare archive member names: no leading slash, forward
/// slashes, ASCII lowercase
pub fn part_key(name: &str) -> String {
    name.trim_start_matches('/').replace('\\', "/").to_ascii_lowercase()
}
