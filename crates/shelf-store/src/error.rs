use std::path::PathBuf;

use shelf_gate::GateError;
use shelf_shard::ShardError;
use shelf_types::TypeError;

/// Errors from object store operations.
///
/// A missing record is not an error: reads return `Ok(None)` and deletes of
/// absent records return `Ok(true)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store itself is misconfigured (bad base directory or settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Entity metadata could not be resolved or does not match a document.
    #[error(transparent)]
    Metadata(#[from] TypeError),

    /// The identifier or layout cannot produce a record path.
    #[error(transparent)]
    Shard(#[from] ShardError),

    /// Optimistic version check failed; nothing was written.
    #[error("version conflict for {type_name}/{id}: entity has {presented:?}, store has {stored:?}")]
    VersionConflict {
        type_name: String,
        id: String,
        presented: Option<i64>,
        stored: Option<i64>,
    },

    /// Create-only save hit an existing record.
    #[error("record already exists: {type_name}/{id}")]
    AlreadyExists { type_name: String, id: String },

    /// Converting between an entity and its JSON document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored document could not be decoded.
    #[error("corrupt record {}: {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },

    /// Waiting for the concurrency gate failed.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error stems from configuration (store settings or entity
    /// metadata) and will recur on every attempt.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Metadata(TypeError::Configuration { .. })
                | Self::Shard(ShardError::InvalidLayout(_))
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
