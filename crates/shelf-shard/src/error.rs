use shelf_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShardError {
    #[error("invalid shard layout: {0}")]
    InvalidLayout(String),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("identifier {0:?} resolved to an empty shard code")]
    EmptyShard(String),
}

pub type ShardResult<T> = Result<T, ShardError>;
