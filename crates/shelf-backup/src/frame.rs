//! Stream framing.
//!
//! A backup is a sequence of tags, each a big-endian `u16` byte length
//! followed by that many UTF-8 bytes. File tags are followed by a big-endian
//! `u64` content length and the raw content.
//!
//! ```text
//! v:1.0\n
//! F:/<relative path>  <u64 len>  <len bytes>     (repeated)
//! $:<64 hex chars, SHA-256 of all content bytes>
//! ```

use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

use crate::error::{BackupError, BackupResult};

/// Format version written in the header.
pub const FORMAT_VERSION: &str = "1.0";

pub const VERSION_PREFIX: &str = "v:";
pub const FILE_PREFIX: &str = "F:";
pub const CHECKSUM_PREFIX: &str = "$:";

pub const MAX_TAG_LEN: usize = u16::MAX as usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    Version(String),
    File(String),
    Checksum(String),
}

impl Tag {
    pub fn encode(&self) -> String {
        match self {
            Tag::Version(v) => format!("{VERSION_PREFIX}{v}\n"),
            Tag::File(path) => format!("{FILE_PREFIX}{path}"),
            Tag::Checksum(hex) => format!("{CHECKSUM_PREFIX}{hex}"),
        }
    }

    /// Parse a tag. Version and checksum values are trimmed; file paths are
    /// taken verbatim.
    pub fn parse(raw: &str) -> BackupResult<Self> {
        if let Some(rest) = raw.strip_prefix(VERSION_PREFIX) {
            Ok(Tag::Version(rest.trim().to_string()))
        } else if let Some(rest) = raw.strip_prefix(FILE_PREFIX) {
            Ok(Tag::File(rest.to_string()))
        } else if let Some(rest) = raw.strip_prefix(CHECKSUM_PREFIX) {
            Ok(Tag::Checksum(rest.trim().to_string()))
        } else {
            let shown: String = raw.chars().take(32).collect();
            Err(BackupError::CorruptStream(format!("unknown tag {shown:?}")))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Tag::Version(_) => "version",
            Tag::File(_) => "file",
            Tag::Checksum(_) => "checksum",
        }
    }
}

pub fn write_tag<W: Write>(sink: &mut W, tag: &Tag) -> BackupResult<()> {
    let text = tag.encode();
    let len = u16::try_from(text.len()).map_err(|_| BackupError::TagTooLong { len: text.len() })?;
    let mut frame = Vec::with_capacity(2 + text.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(text.as_bytes());
    sink.write_all(&frame)?;
    Ok(())
}

pub fn read_tag<R: Read>(source: &mut R) -> BackupResult<Tag> {
    let mut len = [0u8; 2];
    read_exact(source, &mut len, "tag length")?;
    let mut buf = vec![0u8; usize::from(u16::from_be_bytes(len))];
    read_exact(source, &mut buf, "tag")?;
    let text = String::from_utf8(buf)
        .map_err(|_| BackupError::CorruptStream("tag is not valid UTF-8".into()))?;
    Tag::parse(&text)
}

pub fn write_len<W: Write>(sink: &mut W, len: u64) -> BackupResult<()> {
    sink.write_all(&len.to_be_bytes())?;
    Ok(())
}

pub fn read_len<R: Read>(source: &mut R) -> BackupResult<u64> {
    let mut buf = [0u8; 8];
    read_exact(source, &mut buf, "content length")?;
    Ok(u64::from_be_bytes(buf))
}

fn read_exact<R: Read>(source: &mut R, buf: &mut [u8], what: &str) -> BackupResult<()> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            BackupError::CorruptStream(format!("unexpected end of stream reading {what}"))
        } else {
            BackupError::Io(e)
        }
    })
}

/// Writer adapter feeding everything written into a running digest.
pub struct DigestWriter<'a, W> {
    inner: W,
    digest: &'a mut Sha256,
}

impl<'a, W: Write> DigestWriter<'a, W> {
    pub fn new(inner: W, digest: &'a mut Sha256) -> Self {
        Self { inner, digest }
    }
}

impl<W: Write> Write for DigestWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
