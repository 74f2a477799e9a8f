use std::time::Duration;

use thiserror::Error;

/// Which permit a caller was waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermitKind {
    Mutation,
    Exclusive,
}

impl std::fmt::Display for PermitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mutation => write!(f, "mutation"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Waiting for a permit exceeded the configured bound.
    #[error("gate unavailable: timed out after {waited:?} waiting for {permit} permit")]
    Timeout { permit: PermitKind, waited: Duration },

    /// A previous exclusive holder failed without releasing the gate.
    #[error("gate is stuck: a previous exclusive holder did not complete")]
    Stuck,
}

pub type GateResult<T> = Result<T, GateError>;
