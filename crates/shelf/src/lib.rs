//! Shelf: a sharded, file-backed JSON document store.
//!
//! Entities declare their type name, identifier field and optional version
//! field through [`Entity::descriptor`]. Each record is stored as one JSON
//! file under a shard directory derived from its identifier, and the whole
//! store can be streamed to a checksummed backup and restored from one.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use shelf::{Entity, EntityDescriptor, Shelf};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Widget {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Entity for Widget {
//!     fn descriptor() -> EntityDescriptor {
//!         EntityDescriptor::new("Widget").identifier("id")
//!     }
//!
//!     fn assign_identifier(&mut self, id: &str) {
//!         self.id = id.to_string();
//!     }
//! }
//!
//! let shelf = Shelf::open_dir("storage")?;
//! shelf.upsert(&mut Widget { id: "a".into(), name: "first".into() })?;
//! let widget: Option<Widget> = shelf.read("a")?;
//! # Ok::<(), shelf::ShelfError>(())
//! ```

pub mod config;
pub mod error;
pub mod shelf;

pub use config::ShelfConfig;
pub use error::{ShelfError, ShelfResult};
pub use shelf::Shelf;

// Re-export key types
pub use shelf_backup::{BackupError, BackupReport, RestoreMode};
pub use shelf_gate::{GateConfig, GateError, GateSnapshot};
pub use shelf_shard::ShardLayout;
pub use shelf_store::{ObjectStore, StoreConfig, StoreError};
pub use shelf_types::{Entity, EntityDescriptor, FieldRole, IdGenerator, UuidGenerator};
