//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Transport-level error types.
///
/// Ledger rule violations carry their own error enum in the core crate;
/// this type covers request-level failures around it.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request does not say who is acting.
    #[error("{0}")]
    MissingActor(String),

    /// Malformed request input.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingActor(_) => 401,
            Self::Validation(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingActor(_) => "MISSING_ACTOR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}
