//! JWT token issuance and validation
//!
//! Implements the session token pair with HMAC-SHA256 signing:
//! - Access tokens carry the caller's identity claims and live 12 hours
//! - Refresh tokens carry no identity and live 100 hours
//!
//! The signing secret is injected through [`JwtConfig`]; nothing here reads
//! the environment.

use super::models::{TokenPair, UserRole};
use chrono::{DateTime, Duration, Utc};
use cinedex_core::AuthConfig;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access token claims
///
/// These claims are embedded in the access token and become the
/// authenticated identity of a request once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,
    /// User's email address
    pub email: String,
    /// User's display name
    pub name: String,
    pub username: String,
    pub role: UserRole,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// JWT ID - makes every issued token unique
    pub jti: String,
}

/// Refresh token claims (no identity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// JWT issuance and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token lifetime {key}={hours}h is out of range")]
    InvalidLifetime { key: &'static str, hours: i64 },

    #[error("Token is malformed or its signature is invalid")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredToken,
}

/// JWT Configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token lifetime (default: 12 hours)
    pub access_ttl: Duration,
    /// Refresh token lifetime (default: 100 hours)
    pub refresh_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::hours(12),
            refresh_ttl: Duration::hours(100),
        }
    }
}

impl TryFrom<&AuthConfig> for JwtConfig {
    type Error = JwtError;

    fn try_from(config: &AuthConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            secret: config.jwt_secret.clone(),
            access_ttl: lifetime("JWT_ACCESS_TTL_HOURS", config.access_ttl_hours)?,
            refresh_ttl: lifetime("JWT_REFRESH_TTL_HOURS", config.refresh_ttl_hours)?,
        })
    }
}

fn lifetime(key: &'static str, hours: i64) -> Result<Duration, JwtError> {
    Duration::try_hours(hours)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or(JwtError::InvalidLifetime { key, hours })
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Identity an access token is issued for
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub subject_id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub username: &'a str,
    pub role: UserRole,
}

/// Issues and validates session tokens with one signing secret
///
/// Read-only after construction, so a single instance is shared by every
/// request task.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service
    ///
    /// # Errors
    ///
    /// * `JwtError::MissingSecret` - the secret is empty
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        if config.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        })
    }

    /// Issue a fresh token pair for `subject`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cinedex_api::auth::jwt::{JwtConfig, TokenService, TokenSubject};
    /// use cinedex_api::auth::models::UserRole;
    ///
    /// let tokens = TokenService::new(JwtConfig::new("s3cret")).unwrap();
    /// let pair = tokens.issue(&TokenSubject {
    ///     subject_id: "0192...",
    ///     email: "ada@example.com",
    ///     display_name: "Ada",
    ///     username: "ada",
    ///     role: UserRole::User,
    /// }).unwrap();
    /// let claims = tokens.validate(&pair.token).unwrap();
    /// assert_eq!(claims.email, "ada@example.com");
    /// ```
    pub fn issue(&self, subject: &TokenSubject<'_>) -> Result<TokenPair, JwtError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token pair as if the current time were `now`
    pub fn issue_at(
        &self,
        subject: &TokenSubject<'_>,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, JwtError> {
        let iat = now.timestamp();

        let claims = Claims {
            sub: subject.subject_id.to_string(),
            email: subject.email.to_string(),
            name: subject.display_name.to_string(),
            username: subject.username.to_string(),
            role: subject.role,
            iat,
            exp: (now + self.access_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let refresh_claims = RefreshClaims {
            iat,
            exp: (now + self.refresh_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        Ok(TokenPair {
            token: encode(&header, &claims, &self.encoding_key)?,
            refresh_token: encode(&header, &refresh_claims, &self.encoding_key)?,
        })
    }

    /// Validate an access token and extract its claims
    ///
    /// Pure; performs no I/O.
    ///
    /// # Errors
    ///
    /// * `JwtError::ExpiredToken` - `exp` is in the past
    /// * `JwtError::MalformedToken` - anything else (bad signature, garbage, missing claims)
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode(token)
    }

    /// Validate a refresh token (signature and expiry only)
    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.decode(token)
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::MalformedToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(JwtConfig::new(secret)).unwrap()
    }

    fn subject() -> TokenSubject<'static> {
        TokenSubject {
            subject_id: "u-1",
            email: "ada@example.com",
            display_name: "Ada Lovelace",
            username: "ada",
            role: UserRole::Admin,
        }
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let tokens = service("test-secret");
        let now = Utc::now();
        let pair = tokens.issue_at(&subject(), now).unwrap();

        let claims = tokens.validate(&pair.token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 12 * 3600);

        let refresh = tokens.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.exp - refresh.iat, 100 * 3600);
    }

    #[test]
    fn test_refresh_token_carries_no_identity() {
        let tokens = service("test-secret");
        let pair = tokens.issue(&subject()).unwrap();

        // Identity claims are missing, so it cannot pass as an access token
        assert!(matches!(
            tokens.validate(&pair.refresh_token),
            Err(JwtError::MalformedToken)
        ));
    }

    #[test]
    fn test_pairs_issued_in_same_second_differ() {
        let tokens = service("test-secret");
        let now = Utc::now();

        let first = tokens.issue_at(&subject(), now).unwrap();
        let second = tokens.issue_at(&subject(), now).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_access_token() {
        let tokens = service("test-secret");
        let thirteen_hours_ago = Utc::now() - Duration::hours(13);
        let pair = tokens.issue_at(&subject(), thirteen_hours_ago).unwrap();

        assert!(matches!(
            tokens.validate(&pair.token),
            Err(JwtError::ExpiredToken)
        ));
        // Refresh lifetime is longer, so the refresh token is still good
        assert!(tokens.validate_refresh(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = service("secret1").issue(&subject()).unwrap();

        let result = service("secret2").validate(&pair.token);
        assert!(matches!(result, Err(JwtError::MalformedToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service("test-secret");

        for token in ["", "invalid.token.here", "a.b", "not a jwt"] {
            assert!(
                matches!(tokens.validate(token), Err(JwtError::MalformedToken)),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_lifetimes_from_config_are_bounded() {
        let mut config = AuthConfig {
            jwt_secret: "s3cret".to_string(),
            ..AuthConfig::default()
        };
        let jwt = JwtConfig::try_from(&config).unwrap();
        assert_eq!(jwt.access_ttl, Duration::hours(config.access_ttl_hours));

        config.access_ttl_hours = i64::MAX;
        assert!(matches!(
            JwtConfig::try_from(&config),
            Err(JwtError::InvalidLifetime { key: "JWT_ACCESS_TTL_HOURS", .. })
        ));

        config.access_ttl_hours = 12;
        config.refresh_ttl_hours = -1;
        assert!(matches!(
            JwtConfig::try_from(&config),
            Err(JwtError::InvalidLifetime { key: "JWT_REFRESH_TTL_HOURS", .. })
        ));
    }

    #[test]
    fn test_empty_secret_is_unavailable() {
        assert!(matches!(
            TokenService::new(JwtConfig::new("")),
            Err(JwtError::MissingSecret)
        ));
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = JwtConfig::new("do-not-print-me");
        assert!(!format!("{config:?}").contains("do-not-print-me"));
    }
}
