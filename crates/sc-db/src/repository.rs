//! Repository error type shared by every store

use sc_core::ScError;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back into the domain
    #[error("Corrupt row: {0}")]
    Decode(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for ScError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => ScError::NotFound {
                entity: "Record",
                id: what,
            },
            other => {
                tracing::error!(error = %other, "repository failure");
                ScError::persistence(other)
            }
        }
    }
}

pub(crate) fn decode<T, E: std::fmt::Display>(result: Result<T, E>) -> RepositoryResult<T> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_are_opaque() {
        let err: ScError = RepositoryError::Conflict("duplicate key".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_client_error());
    }
}
