//! Authentication and authorization module
//!
//! This module provides JWT-based authentication with the following components:
//! - Token issuance and validation
//! - Password hashing with Argon2
//! - The access gate middleware and role checks
//! - Authentication service for signup, login and refresh
//! - Account models and the credential store

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use jwt::{Claims, JwtConfig, JwtError, TokenService, TokenSubject};
pub use middleware::{
    auth_middleware, authorize_role, authorize_self_or_role, token_from_headers, AuthError,
    AuthenticatedUser, TOKEN_HEADER,
};
pub use models::{
    AuthenticatedSession, LoginRequest, RefreshRequest, SignupRequest, TokenPair, User,
    UserPublic, UserRole,
};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordConfig};
pub use repository::UserRepository;
pub use service::AuthService;
