//! Crate-wide error type
//!
//! Storage failures are wrapped, never retried. Callers decide what to do with them.

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Corrupt stored value: {0}")]
    Corrupt(String),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AdminError::NotFound(what.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdminError::BadRequest(msg.into())
    }

    /// True for errors caused by the caller's input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdminError::InvalidFilter(_)
                | AdminError::InvalidPagination(_)
                | AdminError::NotFound(_)
                | AdminError::BadRequest(_)
        )
    }
}
