//! Cinedex Core - Domain models, errors, and shared configuration
//!
//! This crate defines the pieces shared by the store and the API server:
//! - Catalog records (genres, movies, reviews)
//! - Common error types
//! - Configuration management
//! - Record identifier generation

pub mod catalog;
pub mod config;

pub use catalog::{Genre, Movie, Review};
pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig, StoreBackend,
};

use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Cinedex operations
#[derive(Error, Debug)]
pub enum CinedexError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{operation} did not complete within {after_secs}s")]
    DeadlineExceeded { operation: String, after_secs: u64 },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CinedexError>;

// ============================================================================
// Identifiers
// ============================================================================

/// Generate a new record identifier.
///
/// UUIDv7 values sort by creation time, so a store that orders records by
/// key returns them in insertion order.
pub fn new_record_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_are_time_ordered() {
        let first = new_record_id();
        let second = new_record_id();

        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_deadline_error_message() {
        let err = CinedexError::DeadlineExceeded {
            operation: "find genre".to_string(),
            after_secs: 100,
        };
        assert_eq!(err.to_string(), "find genre did not complete within 100s");
    }
}
