use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shelf_types::{validate_identifier, validate_type_name};

use crate::error::{ShardError, ShardResult};
use crate::resolver::resolve;

/// Default shard code width.
pub const DEFAULT_WIDTH: usize = 5;

/// Default shard alphabet: digits and lowercase ASCII letters.
pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// File extension of record documents.
pub const RECORD_EXTENSION: &str = "json";

/// Shard configuration of a store: code width and alphabet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardLayout {
    pub width: usize,
    pub alphabet: String,
}

impl Default for ShardLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            alphabet: DEFAULT_ALPHABET.to_string(),
        }
    }
}

impl ShardLayout {
    /// Create and validate a layout.
    pub fn new(width: usize, alphabet: impl Into<String>) -> ShardResult<Self> {
        let layout = Self {
            width,
            alphabet: alphabet.into(),
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Check that every shard code this layout can produce is a usable
    /// directory name.
    pub fn validate(&self) -> ShardResult<()> {
        if self.width == 0 {
            return Err(ShardError::InvalidLayout("width must be > 0".into()));
        }
        if self.alphabet.is_empty() {
            return Err(ShardError::InvalidLayout("alphabet must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for ch in self.alphabet.chars() {
            if ch == '/' || ch == '\\' || ch == '.' || ch.is_control() || ch.is_whitespace() {
                return Err(ShardError::InvalidLayout(format!(
                    "alphabet contains unusable character {ch:?}"
                )));
            }
            if !seen.insert(ch) {
                return Err(ShardError::InvalidLayout(format!(
                    "alphabet contains {ch:?} more than once"
                )));
            }
        }
        Ok(())
    }

    /// Number of distinct shard directories per type, if it fits in a `u64`.
    pub fn bucket_count(&self) -> Option<u64> {
        let radix = self.alphabet.chars().count() as u64;
        u32::try_from(self.width)
            .ok()
            .and_then(|w| radix.checked_pow(w))
    }

    /// Shard code for an identifier.
    ///
    /// The identifier is trimmed before hashing, so ids differing only in
    /// surrounding whitespace land in the same shard.
    pub fn shard_code(&self, id: &str) -> ShardResult<String> {
        validate_identifier(id)?;
        let alphabet: Vec<char> = self.alphabet.chars().collect();
        let code = resolve(id.trim(), self.width, &alphabet);
        if code.is_empty() {
            return Err(ShardError::EmptyShard(id.to_string()));
        }
        Ok(code)
    }

    /// Root directory of a type: `<base>/<type>`.
    pub fn type_dir(&self, base: &Path, type_name: &str) -> ShardResult<PathBuf> {
        validate_type_name(type_name)?;
        Ok(base.join(type_name))
    }

    /// Full record path: `<base>/<type>/<shard>/<id>.json`.
    pub fn record_path(&self, base: &Path, type_name: &str, id: &str) -> ShardResult<PathBuf> {
        let shard = self.shard_code(id)?;
        Ok(self
            .type_dir(base, type_name)?
            .join(shard)
            .join(format!("{id}.{RECORD_EXTENSION}")))
    }
}

/// Recover the identifier from a record file name (`<id>.json`).
///
/// Returns `None` for anything that is not a record document.
pub fn identifier_from_file_name(name: &str) -> Option<&str> {
    let id = name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    if id.is_empty() || id.starts_with('.') {
        return None;
    }
    Some(id)
}
