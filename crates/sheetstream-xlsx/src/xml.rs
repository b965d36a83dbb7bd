//! Owned XML events over `quick-xml`
//!
//! Parts of an XLSX package are consumed by small state machines that only
//! care about element local names, attributes and text. [`XmlEventRouter`]
//! flattens `quick-xml` events into that shape: namespace prefixes are
//! dropped, self-closing elements become an open/close pair, and text is
//! unescaped.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XlsxResult;

/// An opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local name (no namespace prefix)
    pub name: String,
    /// Attributes by local name, in document order
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Look up an attribute by local name
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Boolean attribute: `1` or `true`
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.attr(key), Some("1") | Some("true"))
    }
}

/// One structural event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Element opened
    Open(Element),
    /// Character data (entity-unescaped; CDATA included)
    Text(String),
    /// Element closed; carries the local name
    Close(String),
}

/// Pulls [`XmlEvent`]s from a byte source
pub struct XmlEventRouter<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlEventRouter<R> {
    /// Create a router. With `trim`, text is trimmed at both ends and
    /// whitespace-only text dropped; without it text is reported verbatim.
    pub fn new(source: R, trim: bool) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(trim);
        reader.expand_empty_elements(true);
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next event, or `None` at end of document
    pub fn next_event(&mut self) -> XlsxResult<Option<XmlEvent>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => XmlEvent::Open(element(&e)?),
                Event::End(e) => XmlEvent::Close(local(e.local_name().as_ref())),
                Event::Text(t) => {
                    let text = t.unescape()?;
                    if text.is_empty() {
                        continue;
                    }
                    XmlEvent::Text(text.into_owned())
                }
                Event::CData(c) => {
                    XmlEvent::Text(String::from_utf8_lossy(&c.into_inner()).into_owned())
                }
                Event::Eof => return Ok(None),
                _ => continue,
            };
            return Ok(Some(event));
        }
    }

    /// Recover the underlying source
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

fn local(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn element(e: &BytesStart<'_>) -> XlsxResult<Element> {
    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?.into_owned();
        attributes.push((local(attr.key.local_name().as_ref()), value));
    }
    Ok(Element {
        name: local(e.local_name().as_ref()),
        attributes,
    })
}
