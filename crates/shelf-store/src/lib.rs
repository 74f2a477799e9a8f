//! Sharded, file-backed JSON object store for Shelf.
//!
//! Each entity instance is one JSON document at
//! `<base>/<type>/<shard>/<id>.json`, where the shard directory is derived
//! deterministically from the identifier (see `shelf-shard`).
//!
//! # Design Rules
//!
//! 1. Every write is write-temp-then-rename; readers never see partial files.
//! 2. Writes to one path are serialized by a per-path lock.
//! 3. Mutations hold a gate permit so whole-store backups can drain them.
//! 4. Reads take the path lock but never a gate permit.
//! 5. A missing record is `None`, not an error.
//! 6. Optimistic versions are checked, never advanced, by the store.

pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod store;

pub use codec::{DocumentCodec, JsonCodec};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::ObjectStore;
