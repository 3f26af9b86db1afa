use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Failure of a service operation. The API maps each variant to a status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input. `field` names the offending field or tree path.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("You do not have permission to perform this action")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Maps validator errors onto the first failing field.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        Self::Validation {
            field: common::first_invalid_field(errors).unwrap_or_default(),
            message: common::format_validation_errors(errors),
        }
    }
}

/// True when the database rejected a write because of a unique constraint.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Converts unique-constraint failures into [`AppError::Conflict`].
pub fn conflict_on_unique(err: DbErr, message: impl Into<String>) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(message.into())
    } else {
        AppError::Database(err)
    }
}
