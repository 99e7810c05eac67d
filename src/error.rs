//! Application error types

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Watchlist configuration not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid watchlist configuration: {0}")]
    ConfigInvalid(String),

    #[error("Storage error: {0}")]
    Storage(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Process exit codes per error class, for scripting around the CLI.
impl From<&AppError> for ExitCode {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Io(_) => ExitCode::from(1),
            AppError::ConfigNotFound { .. } | AppError::ConfigInvalid(_) => ExitCode::from(2),
            AppError::Storage(_) => ExitCode::from(3),
            AppError::Csv(_) | AppError::Provider(_) | AppError::Validation(_) => {
                ExitCode::from(4)
            }
            AppError::Internal(_) => ExitCode::from(5),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
