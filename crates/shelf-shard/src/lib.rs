//! Shard path resolution for Shelf.
//!
//! Records live at `<base>/<type>/<shard>/<id>.json`. The shard code is a
//! fixed-width directory name derived deterministically from the identifier,
//! fanning a large collection out across `alphabet.len() ^ width` buckets so
//! no single directory grows without bound.
//!
//! The mixing function is bit-compatible with existing on-disk layouts; see
//! [`resolve`]. Re-sharding an existing store is not supported: a store must
//! be opened with the same [`ShardLayout`] for its whole life.

pub mod error;
pub mod layout;
pub mod resolver;

pub use error::{ShardError, ShardResult};
pub use layout::{identifier_from_file_name, ShardLayout, DEFAULT_ALPHABET, DEFAULT_WIDTH, RECORD_EXTENSION};
pub use resolver::resolve;
