use crate::application::validators::ValidationError;
use crate::infrastructure::{BlobError, RepositoryError};
use tracing::debug;

/// Failure taxonomy shared by every use case. The interface layer maps each
/// variant onto one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn invalid_credentials() -> Self {
        ServiceError::Authentication("Invalid credentials".to_string())
    }

    pub fn access_denied() -> Self {
        ServiceError::Authorization("Access denied: insufficient permissions".to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        if let ValidationError::FieldValidation { field, .. } = &err {
            debug!(field = %field, "Rejected input field");
        }
        ServiceError::Validation(err.to_string())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(_) => {
                ServiceError::Conflict("Record already exists".to_string())
            }
            other => ServiceError::Unexpected(other.to_string()),
        }
    }
}

impl From<BlobError> for ServiceError {
    fn from(err: BlobError) -> Self {
        ServiceError::Unexpected(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ServiceError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ServiceError::Unexpected(format!("Password hashing failed: {err}"))
    }
}
