//! Concurrency gate for Shelf.
//!
//! Two mechanisms coordinate access to the on-disk store:
//!
//! - [`Gate`]: a process-wide barrier. Any number of mutations run
//!   concurrently under [`MutationPermit`]s; a backup or restore takes an
//!   [`ExclusivePermit`], which stops new mutations from starting and waits for
//!   the ones already admitted to drain.
//! - [`PathLocks`]: one mutex per record path, serializing readers and writers
//!   of the same document.
//!
//! # Rules
//!
//! 1. Reads never take gate permits.
//! 2. Exclusive acquisition never preempts another exclusive holder.
//! 3. Every wait is bounded; exceeding the bound is [`GateError::Timeout`].
//! 4. An exclusive holder that unwinds leaves the gate stuck. Every later
//!    acquire fails with [`GateError::Stuck`] instead of bypassing the gate.

pub mod config;
pub mod error;
pub mod gate;
pub mod locks;

pub use config::GateConfig;
pub use error::{GateError, GateResult, PermitKind};
pub use gate::{ExclusivePermit, Gate, GateSnapshot, MutationPermit};
pub use locks::PathLocks;
