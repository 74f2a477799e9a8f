use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary of one backup or restore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    /// Number of file entries in the stream.
    pub files: usize,
    /// Total content bytes.
    pub bytes: u64,
    /// File entries per entity type (leading path segment).
    pub per_type: BTreeMap<String, usize>,
    /// Lowercase hex SHA-256 over all content bytes.
    pub checksum: String,
}

impl BackupReport {
    pub(crate) fn record(&mut self, relative_path: &str, len: u64) {
        self.files += 1;
        self.bytes += len;
        let mut segments = relative_path.split('/').filter(|s| !s.is_empty());
        if let (Some(type_name), Some(_)) = (segments.next(), segments.next()) {
            *self.per_type.entry(type_name.to_string()).or_default() += 1;
        }
    }
}

/// How a restore treats files already present in the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreMode {
    /// Remove everything under the base directory before replaying.
    #[default]
    Replace,
    /// Keep existing files; files in the stream overwrite their namesakes.
    Additive,
}

impl RestoreMode {
    pub fn from_additive(additive: bool) -> Self {
        if additive {
            Self::Additive
        } else {
            Self::Replace
        }
    }

    pub fn is_additive(self) -> bool {
        self == Self::Additive
    }
}
