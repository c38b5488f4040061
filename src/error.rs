use crate::auth::{AuthError, BootstrapError};
use crate::store::StoreError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Table store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Auth provider errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Client could not be constructed
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Form validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unauthorized access errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID parsing errors
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    /// Local file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Check if error came from form validation
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// Message shown to the end user.
    ///
    /// Validation and remote messages pass through; everything else collapses
    /// to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Validation(msg) | AppError::Unauthorized(msg) | AppError::Message(msg) => {
                msg.clone()
            }
            AppError::Store(StoreError::Remote { message, .. }) => message.clone(),
            AppError::Auth(err @ AuthError::Rejected { .. })
            | AppError::Auth(err @ AuthError::InvalidCredentials) => err.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Store call failed
    #[error("Query error: {0}")]
    Query(StoreError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint or row-level security violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Row could not be decoded into its model
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Result type alias for repository calls
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Store(e),
            RepositoryError::Duplicate(msg) => AppError::Message(format!("Duplicate: {}", msg)),
            RepositoryError::ConstraintViolation(msg) => AppError::Unauthorized(msg),
            RepositoryError::InvalidRow(msg) => AppError::Message(format!("Invalid row: {}", msg)),
        }
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Remote { code, message, .. } => match code.as_deref() {
                // No rows for a single-row request
                Some("PGRST116") => RepositoryError::NotFound(message.clone()),
                // Unique violation
                Some("23505") => RepositoryError::Duplicate(message.clone()),
                // Foreign key, check constraint, row-level security
                Some("23503") | Some("23514") | Some("42501") => {
                    RepositoryError::ConstraintViolation(message.clone())
                }
                _ => RepositoryError::Query(err),
            },
            StoreError::Decode(msg) => RepositoryError::InvalidRow(msg.clone()),
            _ => RepositoryError::Query(err),
        }
    }
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}
