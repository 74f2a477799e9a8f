use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("store error: {0}")]
    Store(#[from] shelf_store::StoreError),

    #[error("backup error: {0}")]
    Backup(#[from] shelf_backup::BackupError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShelfError {
    /// Errors that will recur until configuration or entity declarations
    /// are fixed.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Store(e) => e.is_configuration(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for ShelfError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type ShelfResult<T> = Result<T, ShelfError>;
