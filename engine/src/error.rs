//! Error handling for the Sachet Water Management engine
//!
//! Every public operation reports failures synchronously through this
//! taxonomy and leaves the ledger and sale history unmodified on error.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    InvalidInput { field: String, message: String },

    // Business rule errors
    #[error("Insufficient stock: {available} bags available, {requested} requested")]
    InsufficientStock { available: u32, requested: u32 },

    #[error("{0}")]
    ChannelClosed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Shorthand for a field-level validation failure
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the app shell to key dialogs off
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "VALIDATION_ERROR",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::ChannelClosed(_) => "CHANNEL_CLOSED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;
