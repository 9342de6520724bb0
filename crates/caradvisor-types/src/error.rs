use thiserror::Error;

/// Errors surfaced by the advisor services to their callers.
///
/// Every variant maps to one HTTP status in the API layer; none of them is
/// retried internally.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("data access error: {0}")]
    DataAccess(String),

    #[error("external service error: {0}")]
    ExternalService(String),
}

/// Errors from repository operations (used by trait definitions in caradvisor-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for AdvisorError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => AdvisorError::NotFound("car".to_string()),
            RepositoryError::Conflict(msg) => AdvisorError::Validation(msg),
            other => AdvisorError::DataAccess(other.to_string()),
        }
    }
}
