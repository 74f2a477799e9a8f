use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use shelf_store::fs::{commit_temp_file, temp_file_for};
use shelf_store::ObjectStore;
use tracing::{debug, info, warn};

use crate::error::{BackupError, BackupResult};
use crate::frame::{read_len, read_tag, DigestWriter, Tag};
use crate::report::{BackupReport, RestoreMode};

/// Major format version this reader understands.
const SUPPORTED_MAJOR: &str = "1";

/// Replays a backup stream into a store.
#[derive(Debug)]
pub struct BackupReader<'a> {
    store: &'a ObjectStore,
}

impl<'a> BackupReader<'a> {
    pub fn new(store: &'a ObjectStore) -> Self {
        Self { store }
    }

    /// Restore from `source`.
    ///
    /// Files are written as they are read, each through a temporary file and
    /// an atomic rename. The checksum is verified at the end; on mismatch the
    /// files already written stay in place and [`BackupError::Integrity`] is
    /// returned.
    pub fn restore<R: Read>(&self, mut source: R, mode: RestoreMode) -> BackupResult<BackupReport> {
        let _permit = self.store.gate().acquire_exclusive()?;
        let base = self.store.base_dir();

        match read_tag(&mut source)? {
            Tag::Version(version) => check_version(&version)?,
            other => {
                return Err(BackupError::CorruptStream(format!(
                    "expected version header, found {} tag",
                    other.kind()
                )))
            }
        }

        if mode == RestoreMode::Replace {
            clear_dir(base)?;
        }

        let mut digest = Sha256::new();
        let mut report = BackupReport::default();
        loop {
            match read_tag(&mut source)? {
                Tag::File(path) => {
                    let (relative, target) = resolve_target(base, &path)?;
                    let len = read_len(&mut source)?;

                    let mut tmp = temp_file_for(&target)?;
                    let copied = io::copy(
                        &mut source.by_ref().take(len),
                        &mut DigestWriter::new(tmp.as_file_mut(), &mut digest),
                    )?;
                    if copied != len {
                        return Err(BackupError::CorruptStream(format!(
                            "entry {path} truncated: expected {len} bytes, got {copied}"
                        )));
                    }
                    commit_temp_file(tmp, &target, self.store.config().fsync)?;

                    debug!(path = %relative, bytes = len, "backup entry restored");
                    report.record(&relative, len);
                }
                Tag::Checksum(expected) => {
                    report.checksum = hex::encode(digest.finalize());
                    if expected.is_empty() {
                        warn!(files = report.files, "backup stream has no checksum");
                        return Err(BackupError::Integrity("checksum entry is empty".into()));
                    }
                    if !expected.eq_ignore_ascii_case(&report.checksum) {
                        warn!(%expected, actual = %report.checksum, "backup checksum mismatch");
                        return Err(BackupError::Integrity(format!(
                            "checksum mismatch: stream declares {expected}, content hashes to {}",
                            report.checksum
                        )));
                    }
                    info!(
                        files = report.files,
                        bytes = report.bytes,
                        additive = mode.is_additive(),
                        checksum = %report.checksum,
                        "backup restored"
                    );
                    return Ok(report);
                }
                Tag::Version(_) => {
                    return Err(BackupError::CorruptStream(
                        "version tag after the header".into(),
                    ))
                }
            }
        }
    }
}

fn check_version(version: &str) -> BackupResult<()> {
    match version.split('.').next() {
        Some(SUPPORTED_MAJOR) => Ok(()),
        _ => Err(BackupError::UnsupportedVersion(version.to_string())),
    }
}

/// Validate a stream path and map it under `base`. Returns the normalized
/// relative path and the target file.
fn resolve_target(base: &Path, path: &str) -> BackupResult<(String, PathBuf)> {
    let relative = path.strip_prefix('/').unwrap_or(path);
    let unsafe_path = || BackupError::CorruptStream(format!("unsafe path {path:?} in backup"));
    if relative.is_empty() {
        return Err(unsafe_path());
    }

    let mut target = base.to_path_buf();
    for segment in relative.split('/') {
        let bad = segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains('\\')
            || segment.chars().any(char::is_control);
        if bad {
            return Err(unsafe_path());
        }
        target.push(segment);
    }
    Ok((relative.to_string(), target))
}

/// Remove everything inside `dir`, keeping `dir` itself.
fn clear_dir(dir: &Path) -> io::Result<()> {
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
        removed += 1;
    }
    debug!(dir = %dir.display(), removed, "cleared store before restore");
    Ok(())
}
