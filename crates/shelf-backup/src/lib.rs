//! Checksummed streaming backup and restore for Shelf stores.
//!
//! A backup captures every file under the store's base directory in one
//! self-delimiting stream ending with a SHA-256 checksum of all content bytes.
//! Both directions hold the store gate's exclusive permit: in-flight
//! mutations drain first and new ones wait until the stream is done.
//!
//! See [`frame`] for the wire format.

pub mod error;
pub mod frame;
pub mod reader;
pub mod report;
pub mod writer;

pub use error::{BackupError, BackupResult};
pub use frame::{Tag, FORMAT_VERSION};
pub use reader::BackupReader;
pub use report::{BackupReport, RestoreMode};
pub use writer::BackupWriter;
