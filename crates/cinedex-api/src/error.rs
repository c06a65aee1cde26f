//! API error handling
//!
//! Every failure leaves the server as `{status, message, error}` where
//! `error` is a stable upper-case code.
//!
//! Author: hephaex@gmail.com

use crate::auth::jwt::JwtError;
use crate::auth::middleware::AuthError;
use crate::auth::password::PasswordError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cinedex_core::CinedexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Human-readable message
    pub message: String,
    /// Error code
    pub error: String,
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No token header provided")]
    MissingCredentials,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    DeadlineExceeded(String),

    #[error("{0}")]
    Signing(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredentials | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Persistence(_) | AppError::Signing(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingCredentials => "MISSING_CREDENTIALS",
            AppError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Duplicate(_) => "DUPLICATE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            AppError::Signing(_) => "SIGNING_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message sent to the client. Signing and internal failures are logged
    /// in full and reported generically.
    fn public_message(&self) -> String {
        match self {
            AppError::Persistence(detail) => {
                tracing::error!(detail = %detail, "Persistence failure");
                format!("Database operation failed: {detail}")
            }
            AppError::Signing(detail) => {
                tracing::error!(detail = %detail, "Token signing failure");
                "Could not issue session tokens".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiError {
            status: status.as_u16(),
            message: self.public_message(),
            error: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CinedexError> for AppError {
    fn from(err: CinedexError) -> Self {
        match err {
            CinedexError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            CinedexError::Duplicate(msg) => AppError::Duplicate(msg),
            CinedexError::ValidationError(msg) | CinedexError::InvalidFilter(msg) => {
                AppError::Validation(msg)
            }
            CinedexError::DatabaseError(msg) => AppError::Persistence(msg),
            err @ CinedexError::DeadlineExceeded { .. } => {
                AppError::DeadlineExceeded(err.to_string())
            }
            CinedexError::Serialization(e) => {
                AppError::Persistence(format!("stored record could not be decoded: {e}"))
            }
            CinedexError::ConfigError(msg) => AppError::Internal(format!("configuration: {msg}")),
            CinedexError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Signing(_) | JwtError::MissingSecret | JwtError::InvalidLifetime { .. } => {
                AppError::Signing(err.to_string())
            }
            JwtError::MalformedToken | JwtError::ExpiredToken => {
                AppError::InvalidCredentials(err.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => AppError::MissingCredentials,
            AuthError::InvalidCredentials(_) => AppError::InvalidCredentials(err.to_string()),
            AuthError::Forbidden { .. } => AppError::Forbidden(err.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();

        AppError::Validation(messages.join("; "))
    }
}
