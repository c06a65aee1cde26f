//! Account models and auth request/response bodies
//!
//! - UserRole: the two flat access roles
//! - User: stored account record (password digest and current token pair)
//! - UserPublic: what the API returns for a user
//! - Signup/Login/Refresh request bodies with validation rules

use chrono::{DateTime, Utc};
use cinedex_core::new_record_id;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// User role
///
/// Roles are flat: ADMIN does not imply USER and vice versa. On the wire
/// they are the exact strings `"ADMIN"` and `"USER"`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::User => "USER",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    /// Case-sensitive: `"admin"` is not a role
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "USER" => Ok(UserRole::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user account
///
/// This maps to the `user` collection. The password field holds an
/// Argon2id PHC digest; the token fields hold the most recently issued
/// pair and are informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: UserRole,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub const COLLECTION: &'static str = "user";

    /// Create a new account record from an already hashed password
    pub fn new(
        name: String,
        username: String,
        email: String,
        password_digest: String,
        user_type: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: new_record_id(),
            name,
            username,
            email,
            password: password_digest,
            user_type,
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert user to public representation (without credentials)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            user_type: self.user_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserPublic {
    pub user_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub user_type: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signed access and refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    /// Access token, sent back in the `token` header
    pub token: String,
    pub refresh_token: String,
}

/// Response to signup, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedSession {
    #[serde(flatten)]
    pub user: UserPublic,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// User signup request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,

    #[validate(length(min = 2, max = 100, message = "username must be 2-100 characters"))]
    pub username: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,

    /// Defaults to USER
    #[serde(default)]
    pub user_type: UserRole,
}

/// User login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Token refresh request; the access token comes from the `token` header
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}
