use std::path::PathBuf;

use shelf_gate::GateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    /// The stream is malformed: bad header, unknown tag, unsafe path, or it
    /// ended before the checksum entry.
    #[error("corrupt backup stream: {0}")]
    CorruptStream(String),

    /// The trailing checksum is missing or does not match the content.
    #[error("backup integrity check failed: {0}")]
    Integrity(String),

    #[error("unsupported backup format version: {0:?}")]
    UnsupportedVersion(String),

    #[error("backup tag of {len} bytes exceeds the 65535 byte limit")]
    TagTooLong { len: usize },

    /// A stored file name cannot be represented in the stream.
    #[error("path cannot be encoded in a backup: {}", .0.display())]
    UnencodablePath(PathBuf),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BackupResult<T> = Result<T, BackupError>;
