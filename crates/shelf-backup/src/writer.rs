use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use shelf_store::fs::is_temp_file_name;
use shelf_store::ObjectStore;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{BackupError, BackupResult};
use crate::frame::{write_len, write_tag, DigestWriter, Tag, FORMAT_VERSION};
use crate::report::BackupReport;

/// Streams the whole store into a sink.
#[derive(Debug)]
pub struct BackupWriter<'a> {
    store: &'a ObjectStore,
}

impl<'a> BackupWriter<'a> {
    pub fn new(store: &'a ObjectStore) -> Self {
        Self { store }
    }

    /// Write a complete backup.
    ///
    /// Holds the store's exclusive permit for the duration of the walk, so no
    /// mutation is in flight while files are read. Reads continue unhindered.
    pub fn write<W: Write>(&self, mut sink: W) -> BackupResult<BackupReport> {
        write_tag(&mut sink, &Tag::Version(FORMAT_VERSION.to_string()))?;

        let _permit = self.store.gate().acquire_exclusive()?;
        let base = self.store.base_dir();
        let mut digest = Sha256::new();
        let mut report = BackupReport::default();

        for entry in WalkDir::new(base).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if is_temp_file_name(entry.file_name()) {
                warn!(path = %entry.path().display(), "skipping stale temporary file");
                continue;
            }

            let relative = stream_path(base, entry.path())?;
            let file = File::open(entry.path())?;
            let len = file.metadata()?.len();

            write_tag(&mut sink, &Tag::File(format!("/{relative}")))?;
            write_len(&mut sink, len)?;
            let copied = io::copy(
                &mut file.take(len),
                &mut DigestWriter::new(&mut sink, &mut digest),
            )?;
            if copied != len {
                return Err(BackupError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("{} shrank during backup", entry.path().display()),
                )));
            }

            debug!(path = %relative, bytes = len, "backup entry written");
            report.record(&relative, len);
        }

        report.checksum = hex::encode(digest.finalize());
        write_tag(&mut sink, &Tag::Checksum(report.checksum.clone()))?;
        sink.flush()?;

        info!(
            files = report.files,
            bytes = report.bytes,
            checksum = %report.checksum,
            "backup written"
        );
        Ok(report)
    }
}

/// `/`-separated path of `path` relative to `base`.
fn stream_path(base: &Path, path: &Path) -> BackupResult<String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|_| BackupError::UnencodablePath(path.to_path_buf()))?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(
                segment
                    .to_str()
                    .ok_or_else(|| BackupError::UnencodablePath(path.to_path_buf()))?,
            ),
            _ => return Err(BackupError::UnencodablePath(path.to_path_buf())),
        }
    }
    Ok(segments.join("/"))
}
