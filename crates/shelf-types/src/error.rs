use thiserror::Error;

/// Errors produced while resolving entity metadata or validating names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// The entity declaration is structurally invalid, or an encoded document
    /// does not match it. Always fatal for the calling operation.
    #[error("invalid entity metadata for {type_name}: {reason}")]
    Configuration { type_name: String, reason: String },

    /// A type name or identifier cannot be used as a path segment.
    #[error("invalid {kind} {name:?}: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

impl TypeError {
    pub(crate) fn configuration(type_name: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for metadata operations.
pub type TypeResult<T> = Result<T, TypeError>;
