//! Error types shared across the crate.

use std::fmt;

/// Unified error type for store, import/export and API operations
#[derive(Debug)]
pub enum AppError {
    /// A required field is missing or out of range; nothing was persisted
    Validation(String),
    /// Referenced entity does not exist
    NotFound { entity: &'static str, id: i64 },
    /// Version token mismatch at commit time (lost-update protection)
    Conflict { entity: &'static str, id: i64 },
    /// A sale requested more units than the card has in stock
    InsufficientQuantity { available: i64, requested: i64 },
    /// Delete blocked by dependent rows
    ReferentialIntegrity(String),
    /// Database operation failed
    Database(rusqlite::Error),
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// Failed to parse a JSON payload
    Parse(serde_json::Error),
    /// HTTP error status code
    HttpStatus(reqwest::StatusCode),
    /// CSV read error
    Csv(csv::Error),
    /// File I/O error
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound { entity, id } => write!(f, "{} {} not found", entity, id),
            AppError::Conflict { entity, id } => write!(
                f,
                "{} {} was modified by another writer, reload and retry",
                entity, id
            ),
            AppError::InsufficientQuantity {
                available,
                requested,
            } => write!(
                f,
                "Insufficient quantity: {} available, {} requested",
                available, requested
            ),
            AppError::ReferentialIntegrity(msg) => write!(f, "Referential integrity: {}", msg),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Network(e) => write!(f, "Network error: {}", e),
            AppError::Parse(e) => write!(f, "Parse error: {}", e),
            AppError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            AppError::Csv(e) => write!(f, "CSV error: {}", e),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(e) => Some(e),
            AppError::Network(e) => Some(e),
            AppError::Parse(e) => Some(e),
            AppError::Csv(e) => Some(e),
            AppError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

/// Result alias for crate operations
pub type AppResult<T> = Result<T, AppError>;
