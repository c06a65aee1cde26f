//! Access control gate
//!
//! `auth_middleware` authenticates a request from its `token` header and
//! places the caller's identity in the request extensions. Handlers then
//! authorize with [`authorize_role`] or [`authorize_self_or_role`].
//!
//! In handlers, extract the caller:
//!
//! ```
//! use axum::Extension;
//! use cinedex_api::auth::middleware::AuthenticatedUser;
//!
//! async fn protected_handler(Extension(user): Extension<AuthenticatedUser>) -> String {
//!     format!("Hello, {}!", user.name)
//! }
//! ```
use super::jwt::{Claims, JwtError, TokenService};
use super::models::UserRole;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Header carrying the access token
pub const TOKEN_HEADER: &str = "token";

/// Authenticated caller, taken from validated access token claims
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    /// Display name
    pub name: String,
    pub username: String,
    pub role: UserRole,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Gate errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token header provided")]
    MissingCredentials,

    #[error("Invalid token: {0}")]
    InvalidCredentials(#[source] JwtError),

    #[error("This action requires role {required}, caller has role {actual}")]
    Forbidden { required: UserRole, actual: UserRole },
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Authentication middleware that requires a valid access token
///
/// 1. Reads the `token` header (absent or empty: 400, unusable: 401)
/// 2. Validates signature and expiry (failure: 401)
/// 3. Adds [`AuthenticatedUser`] to request extensions
///
/// Rejected requests never reach the handler.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/genres", get(list_genres))
///     .route_layer(middleware::from_fn_with_state(tokens, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = match token_from_headers(request.headers()).and_then(|token| {
        tokens
            .validate(token)
            .map_err(AuthError::InvalidCredentials)
    }) {
        Ok(claims) => claims,
        Err(AuthError::InvalidCredentials(e)) => {
            let client = ClientInfo::from_headers(request.headers());
            audit_log(&AuditEvent::InvalidToken {
                ip_address: client.ip_address,
                user_agent: client.user_agent,
                reason: e.to_string(),
            });
            return Err(AuthError::InvalidCredentials(e));
        }
        Err(e) => return Err(e),
    };

    request.extensions_mut().insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}

/// Read the access token from the `token` header
///
/// An absent or empty header is missing credentials. A header that is present
/// but not visible ASCII, or holds only whitespace, is a malformed token.
pub fn token_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(TOKEN_HEADER) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingCredentials),
    };

    match value.to_str().map(str::trim) {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidCredentials(JwtError::MalformedToken)),
    }
}

/// Require the caller to hold exactly `required`. There is no role hierarchy.
pub fn authorize_role(user: &AuthenticatedUser, required: UserRole) -> Result<(), AuthError> {
    if user.role == required {
        return Ok(());
    }

    audit_log(&AuditEvent::AccessDenied {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        required_role: required.to_string(),
        actual_role: user.role.to_string(),
    });

    Err(AuthError::Forbidden {
        required,
        actual: user.role,
    })
}

/// Allow the owner of a resource, otherwise require `fallback`
pub fn authorize_self_or_role(
    user: &AuthenticatedUser,
    owner_id: &str,
    fallback: UserRole,
) -> Result<(), AuthError> {
    if user.user_id == owner_id {
        return Ok(());
    }
    authorize_role(user, fallback)
}
