// Error taxonomy for the storage layer.
//
// NotFound / Duplicate / Validation are the three outcomes callers branch on
// (the review loop turns a Duplicate rename into a merge confirmation).
// Everything else is wrapped transparently and propagates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        StoreError::Duplicate(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    /// True for the unique-constraint collisions SQLite reports on insert.
    pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::not_found("Author 7").to_string(),
            "Author 7 not found"
        );
        assert_eq!(
            StoreError::duplicate("username or email").to_string(),
            "duplicate username or email"
        );
        assert_eq!(
            StoreError::validation("limit must be positive").to_string(),
            "validation failed: limit must be positive"
        );
    }
}
