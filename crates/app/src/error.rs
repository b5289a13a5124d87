use thiserror::Error;

use pointswap_core::DomainError;
use pointswap_store::{ImportError, StorageError};

pub type AppResult<T> = Result<T, AppError>;

/// Everything a session operation can fail with.
///
/// None of these are fatal: the session state and the persisted data are
/// unchanged after any error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no member is signed in")]
    NotSignedIn,
}

impl AppError {
    /// Stable machine-readable code for the UI.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::Validation(_)) => "validation_error",
            AppError::Domain(DomainError::InvariantViolation(_)) => "invariant_violation",
            AppError::Domain(DomainError::InvalidId(_)) => "invalid_id",
            AppError::Domain(DomainError::NotFound) => "not_found",
            AppError::Domain(DomainError::Unauthorized) => "unauthorized",
            AppError::Import(_) => "import_error",
            AppError::Storage(_) => "storage_error",
            AppError::NotSignedIn => "not_signed_in",
        }
    }

    /// Inline message shown next to the form that triggered the error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::Validation(msg)) => msg.clone(),
            AppError::Domain(DomainError::Unauthorized) => "invalid credentials or insufficient rights".to_string(),
            AppError::Import(_) => "invalid backup file".to_string(),
            other => other.to_string(),
        }
    }
}
