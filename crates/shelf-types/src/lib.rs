//! Foundation types for Shelf.
//!
//! Shelf persists every entity instance as one JSON document on disk. This
//! crate defines how a Rust type declares itself to the store and how that
//! declaration is validated before any file is touched.
//!
//! # Key Types
//!
//! - [`Entity`]: implemented by every persisted type; supplies its descriptor
//! - [`EntityDescriptor`]: explicit schema: type name, identifier field, optional version field
//! - [`EntityMeta`]: a validated descriptor with accessors over encoded documents
//! - [`MetadataRegistry`]: resolves and caches metadata per Rust type
//! - [`IdGenerator`]: strategy used to assign identifiers to new records

pub mod entity;
pub mod error;
pub mod id;
pub mod names;
pub mod registry;

pub use entity::{Entity, EntityDescriptor, FieldRole, FieldSpec};
pub use error::{TypeError, TypeResult};
pub use id::{IdGenerator, UuidGenerator};
pub use names::{validate_identifier, validate_type_name};
pub use registry::{EntityMeta, MetadataRegistry};
