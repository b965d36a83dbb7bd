//! Sequential ZIP member reader
//!
//! Walks local file headers front to back over any [`Read`], without seeking
//! and without the central directory. A member's body is decompressed only as
//! the caller reads it, so the archive can arrive over a pipe or socket.
//!
//! ```
//! use std::io::Read;
//! use sheetstream_xlsx::zip_stream::ZipStream;
//!
//! // an archive with no members: just an end-of-central-directory record
//! let mut bytes = vec![0x50, 0x4b, 0x05, 0x06];
//! bytes.extend_from_slice(&[0; 18]);
//!
//! let mut archive = ZipStream::new(&bytes[..]);
//! assert!(archive.next_entry().unwrap().is_none());
//! ```

use std::io::{self, BufReader, Read, Take};

use flate2::bufread::DeflateDecoder;
use flate2::Crc;
use log::{debug, warn};

use crate::error::{XlsxError, XlsxResult};

const LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
const CENTRAL_DIRECTORY: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
const ZIP64_END_OF_CENTRAL_DIRECTORY: u32 = 0x0606_4b50;
const DATA_DESCRIPTOR: u32 = 0x0807_4b50;

const FLAG_ENCRYPTED: u16 = 1;
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

const ZIP64_EXTRA_FIELD: u16 = 0x0001;

/// Stored (no compression)
pub const METHOD_STORED: u16 = 0;
/// Raw deflate
pub const METHOD_DEFLATED: u16 = 8;

/// Metadata from a member's local header.
///
/// When the member uses a trailing data descriptor, the CRC and sizes are
/// unknown until the body has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Member path inside the archive
    pub name: String,
    /// Compression method id
    pub method: u16,
    /// General purpose bit flags
    pub flags: u16,
    /// Declared CRC-32 of the uncompressed bytes
    pub crc32: u32,
    /// Compressed size, if declared up front
    pub compressed_size: Option<u64>,
    /// Uncompressed size, if declared up front
    pub uncompressed_size: Option<u64>,
    zip64: bool,
}

impl EntryHeader {
    /// Whether CRC and sizes follow the body in a data descriptor
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Whether the member is a directory entry
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

enum Body<R: Read> {
    Stored(Take<BufReader<R>>),
    Deflated(DeflateDecoder<Take<BufReader<R>>>),
    Unsupported(Take<BufReader<R>>),
}

impl<R: Read> Body<R> {
    fn raw(&mut self) -> &mut Take<BufReader<R>> {
        match self {
            Body::Stored(raw) | Body::Unsupported(raw) => raw,
            Body::Deflated(decoder) => decoder.get_mut(),
        }
    }

    fn into_inner(self) -> BufReader<R> {
        match self {
            Body::Stored(raw) | Body::Unsupported(raw) => raw.into_inner(),
            Body::Deflated(decoder) => decoder.into_inner().into_inner(),
        }
    }
}

struct Current<R: Read> {
    header: EntryHeader,
    body: Body<R>,
    crc: Crc,
    produced: u64,
    /// Drained without decompression; CRC and size are not checked
    skipped: bool,
}

impl<R: Read> Current<R> {
    fn skip(&mut self) -> io::Result<()> {
        if self.produced == 0 && self.header.compressed_size.is_some() {
            self.skipped = true;
            io::copy(self.body.raw(), &mut io::sink())?;
        } else {
            io::copy(self, &mut io::sink())?;
        }
        Ok(())
    }
}

impl<R: Read> Read for Current<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.skipped {
            return Ok(0);
        }
        let n = match &mut self.body {
            Body::Stored(raw) => raw.read(buf)?,
            Body::Deflated(decoder) => decoder.read(buf)?,
            Body::Unsupported(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!(
                        "compression method {} is not supported ('{}')",
                        self.header.method, self.header.name
                    ),
                ))
            }
        };
        self.crc.update(&buf[..n]);
        self.produced += n as u64;
        Ok(n)
    }
}

enum State<R: Read> {
    /// Positioned at a record signature
    Boundary(BufReader<R>),
    /// Inside a member body
    Entry(Box<Current<R>>),
    Finished,
    Broken,
}

/// Pull-based reader of ZIP members in archive order
pub struct ZipStream<R: Read> {
    state: State<R>,
    members: usize,
}

impl<R: Read> ZipStream<R> {
    /// Start reading an archive from the beginning of `source`
    pub fn new(source: R) -> Self {
        Self {
            state: State::Boundary(BufReader::with_capacity(64 * 1024, source)),
            members: 0,
        }
    }

    /// Advance to the next member.
    ///
    /// Any unread remainder of the previous member is drained first and its
    /// trailing metadata validated. Returns `Ok(None)` once the central
    /// directory (or a clean end of input) is reached.
    pub fn next_entry(&mut self) -> XlsxResult<Option<ZipEntry<'_, R>>> {
        let mut reader = match std::mem::replace(&mut self.state, State::Broken) {
            State::Boundary(reader) => reader,
            State::Entry(current) => finish(*current)?,
            State::Finished => {
                self.state = State::Finished;
                return Ok(None);
            }
            State::Broken => {
                return Err(XlsxError::InvalidState(
                    "archive stream failed on an earlier member".into(),
                ))
            }
        };

        let Some(header) = read_local_header(&mut reader)? else {
            debug!("end of archive members after {} entries", self.members);
            self.state = State::Finished;
            return Ok(None);
        };

        debug!(
            "zip member '{}' (method {}, {} bytes compressed)",
            header.name,
            header.method,
            header
                .compressed_size
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        let body = open_body(reader, &header)?;
        self.members += 1;
        self.state = State::Entry(Box::new(Current {
            header,
            body,
            crc: Crc::new(),
            produced: 0,
            skipped: false,
        }));
        Ok(self.current_entry())
    }

    /// The member most recently returned by [`next_entry`](Self::next_entry),
    /// if the stream is still positioned inside it
    pub fn current_entry(&mut self) -> Option<ZipEntry<'_, R>> {
        match &mut self.state {
            State::Entry(current) => Some(ZipEntry { current }),
            _ => None,
        }
    }

    /// Number of members seen so far
    pub fn members_seen(&self) -> usize {
        self.members
    }
}

/// One archive member; reads yield decompressed bytes
pub struct ZipEntry<'a, R: Read> {
    current: &'a mut Current<R>,
}

impl<R: Read> ZipEntry<'_, R> {
    /// Member path inside the archive
    pub fn name(&self) -> &str {
        &self.current.header.name
    }

    /// Local header metadata
    pub fn header(&self) -> &EntryHeader {
        &self.current.header
    }

    /// Fail early if the body cannot be decompressed
    pub fn ensure_supported(&self) -> XlsxResult<()> {
        match self.current.body {
            Body::Unsupported(_) => Err(XlsxError::UnsupportedCompression {
                name: self.current.header.name.clone(),
                method: self.current.header.method,
            }),
            _ => Ok(()),
        }
    }

    /// Discard the rest of the member.
    ///
    /// When the compressed size is declared and nothing has been read, the raw
    /// bytes are passed over without decompressing them.
    pub fn skip(self) -> XlsxResult<()> {
        self.current.skip()?;
        Ok(())
    }
}

impl<R: Read> Read for ZipEntry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.current.read(buf)
    }
}

/// Drain a member, read its data descriptor and validate it
fn finish<R: Read>(mut current: Current<R>) -> XlsxResult<BufReader<R>> {
    if !current.skipped {
        current.skip()?;
    }
    if current.header.compressed_size.is_some() {
        // leftover compressed bytes after the end of the deflate stream
        io::copy(current.body.raw(), &mut io::sink())?;
    }

    let Current {
        mut header,
        body,
        crc,
        produced,
        skipped,
    } = current;
    let mut reader = body.into_inner();

    if header.has_data_descriptor() {
        let first = read_u32(&mut reader)?;
        header.crc32 = if first == DATA_DESCRIPTOR {
            read_u32(&mut reader)?
        } else {
            first
        };
        let (compressed, uncompressed) = if header.zip64 {
            (read_u64(&mut reader)?, read_u64(&mut reader)?)
        } else {
            (
                read_u32(&mut reader)? as u64,
                read_u32(&mut reader)? as u64,
            )
        };
        header.compressed_size = Some(compressed);
        header.uncompressed_size = Some(uncompressed);
    }

    if !skipped {
        if let Some(expected) = header.uncompressed_size {
            if expected != produced {
                return Err(XlsxError::InvalidFormat(format!(
                    "size mismatch in '{}': expected {} bytes, got {}",
                    header.name, expected, produced
                )));
            }
        }
        if crc.sum() != header.crc32 {
            return Err(XlsxError::InvalidFormat(format!(
                "CRC mismatch in '{}': expected {:08x}, got {:08x}",
                header.name,
                header.crc32,
                crc.sum()
            )));
        }
    }

    Ok(reader)
}

fn open_body<R: Read>(reader: BufReader<R>, header: &EntryHeader) -> XlsxResult<Body<R>> {
    let raw = reader.take(header.compressed_size.unwrap_or(u64::MAX));
    match header.method {
        METHOD_STORED => {
            if header.compressed_size.is_none() {
                return Err(XlsxError::InvalidFormat(format!(
                    "stored member '{}' has no declared size",
                    header.name
                )));
            }
            Ok(Body::Stored(raw))
        }
        METHOD_DEFLATED => Ok(Body::Deflated(DeflateDecoder::new(raw))),
        method => {
            if header.compressed_size.is_none() {
                return Err(XlsxError::UnsupportedCompression {
                    name: header.name.clone(),
                    method,
                });
            }
            warn!(
                "member '{}' uses unsupported compression method {}",
                header.name, method
            );
            Ok(Body::Unsupported(raw))
        }
    }
}

/// Read the next record signature; `None` on a clean end of input
fn read_signature<B: Read>(reader: &mut B) -> io::Result<Option<u32>> {
    let mut bytes = [0u8; 4];
    let mut filled = 0;
    while filled < bytes.len() {
        match reader.read(&mut bytes[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(u32::from_le_bytes(bytes))),
        _ => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated zip record signature",
        )),
    }
}

fn read_local_header<B: Read>(reader: &mut B) -> XlsxResult<Option<EntryHeader>> {
    let Some(signature) = read_signature(reader)? else {
        return Ok(None);
    };
    match signature {
        LOCAL_FILE_HEADER => {}
        CENTRAL_DIRECTORY | END_OF_CENTRAL_DIRECTORY | ZIP64_END_OF_CENTRAL_DIRECTORY => {
            return Ok(None)
        }
        other => return Err(XlsxError::InvalidSignature(other)),
    }

    let mut fixed = [0u8; 26];
    reader.read_exact(&mut fixed)?;
    let le16 = |at: usize| u16::from_le_bytes([fixed[at], fixed[at + 1]]);
    let le32 = |at: usize| {
        u32::from_le_bytes([fixed[at], fixed[at + 1], fixed[at + 2], fixed[at + 3]])
    };

    let flags = le16(2);
    let method = le16(4);
    let crc32 = le32(10);
    let compressed = le32(14);
    let uncompressed = le32(18);

    let mut name = vec![0u8; le16(22) as usize];
    reader.read_exact(&mut name)?;
    let mut extra = vec![0u8; le16(24) as usize];
    reader.read_exact(&mut extra)?;
    let name = String::from_utf8_lossy(&name).into_owned();

    if flags & FLAG_ENCRYPTED != 0 {
        return Err(XlsxError::InvalidFormat(format!(
            "encrypted member '{}' is not supported",
            name
        )));
    }

    let wide = zip64_sizes(&extra, uncompressed, compressed);
    let deferred = flags & FLAG_DATA_DESCRIPTOR != 0;
    let declared = |narrow: u32, wide: Option<u64>| {
        let size = if narrow == u32::MAX {
            wide
        } else {
            Some(narrow as u64)
        };
        // streamed members write zero sizes up front
        match size {
            Some(0) if deferred => None,
            other => other,
        }
    };

    Ok(Some(EntryHeader {
        compressed_size: declared(compressed, wide.compressed),
        uncompressed_size: declared(uncompressed, wide.uncompressed),
        name,
        method,
        flags,
        crc32,
        zip64: wide.present,
    }))
}

#[derive(Debug, Default)]
struct WideSizes {
    present: bool,
    uncompressed: Option<u64>,
    compressed: Option<u64>,
}

/// Sizes from the zip64 extended information extra field
fn zip64_sizes(extra: &[u8], uncompressed: u32, compressed: u32) -> WideSizes {
    let mut rest = extra;
    while rest.len() >= 4 {
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let len = u16::from_le_bytes([rest[2], rest[3]]) as usize;
        let data = &rest[4..(4 + len).min(rest.len())];
        if id == ZIP64_EXTRA_FIELD {
            let mut values = data
                .chunks_exact(8)
                .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]));
            let mut sizes = WideSizes {
                present: true,
                ..WideSizes::default()
            };
            if data.len() >= 16 {
                sizes.uncompressed = values.next();
                sizes.compressed = values.next();
            } else {
                if uncompressed == u32::MAX {
                    sizes.uncompressed = values.next();
                }
                if compressed == u32::MAX {
                    sizes.compressed = values.next();
                }
            }
            return sizes;
        }
        rest = &rest[(4 + len).min(rest.len())..];
    }
    WideSizes::default()
}

fn read_u32<B: Read>(reader: &mut B) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_u64<B: Read>(reader: &mut B) -> io::Result<u64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}
