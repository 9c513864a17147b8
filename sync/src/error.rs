use thiserror::Error;

/// Mirrors `ImporterError`'s shape (wrap the lower layer, add the steps
/// this resolver owns) with its own step-specific failures.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown meet: {0}")]
    UnknownMeet(String),

    #[error("meet {0} was already synced; pass --force to overwrite")]
    AlreadySynced(String),

    #[error(transparent)]
    Storage(#[from] storage::error::StorageError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownMeet(_) => "NotFound",
            Self::AlreadySynced(_) => "StateConflict",
            Self::Storage(e) => match e {
                storage::error::StorageError::NotFound => "NotFound",
                storage::error::StorageError::BadInput(_) => "BadInput",
                storage::error::StorageError::StateConflict(_) => "StateConflict",
                storage::error::StorageError::NotReady(_) => "NotReady",
                storage::error::StorageError::ConstraintViolation(_) => "BadInput",
                storage::error::StorageError::Database(_) | storage::error::StorageError::Migration(_) => "Fatal",
            },
        }
    }
}
