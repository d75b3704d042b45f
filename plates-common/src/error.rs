//! Common error types for the plate archive

use std::time::Duration;
use thiserror::Error;

/// Common result type for plate archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the plate archive crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plate text does not match any accepted format
    #[error("Invalid plate format: {0:?}")]
    InvalidPlate(String),

    /// Store did not answer within the configured timeout
    #[error("Store timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

