use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("malformed data: {0}")]
    Serialization(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// True for failures of the backing file itself (unreadable, unwritable, corrupt).
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Serialization(_))
    }
}
