//! Authentication service layer
//!
//! Business logic for signup, login, token refresh and user lookup.
//! Combines the credential store, the token service and password hashing;
//! handlers only translate HTTP in and out.

use super::jwt::{TokenService, TokenSubject};
use super::models::{
    AuthenticatedSession, LoginRequest, SignupRequest, TokenPair, User, UserPublic,
};
use super::password::{hash_password, validate_password_strength, verify_password, PasswordConfig};
use super::repository::UserRepository;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use cinedex_store::{PageWindow, PaginatedResult};
use std::sync::Arc;

const INVALID_LOGIN: &str = "invalid email or password";

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: Arc<TokenService>,
    passwords: PasswordConfig,
}

impl AuthService {
    pub fn new(users: UserRepository, tokens: Arc<TokenService>) -> Self {
        Self {
            users,
            tokens,
            passwords: PasswordConfig::default(),
        }
    }

    /// Override the Argon2 cost parameters used for new digests
    pub fn with_password_config(mut self, passwords: PasswordConfig) -> Self {
        self.passwords = passwords;
        self
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Register a new user and open a session for it
    ///
    /// # Arguments
    ///
    /// * `request` - Signup details, already checked by its `Validate` rules
    /// * `client` - Caller metadata for the audit log
    ///
    /// # Returns
    ///
    /// * `Ok(AuthenticatedSession)` - Public user record plus the first token pair
    /// * `Err(AppError)` - Weak password (400), email or username taken (409),
    ///   store failure
    pub async fn signup(
        &self,
        request: SignupRequest,
        client: &ClientInfo,
    ) -> Result<AuthenticatedSession, AppError> {
        if let Err(reason) = validate_password_strength(&request.password) {
            self.signup_rejected(&request.email, &reason, client);
            return Err(AppError::Validation(reason));
        }

        if self.users.email_taken(&request.email).await? {
            self.signup_rejected(&request.email, "email already registered", client);
            return Err(AppError::Duplicate(
                "this email already exists".to_string(),
            ));
        }

        if self.users.username_taken(&request.username).await? {
            self.signup_rejected(&request.email, "username already taken", client);
            return Err(AppError::Duplicate(
                "this username already exists".to_string(),
            ));
        }

        let digest = self.hash(request.password).await?;
        let mut user = User::new(
            request.name,
            request.username,
            request.email,
            digest,
            request.user_type,
        );

        let tokens = self.tokens.issue(&subject_of(&user))?;
        user.token = Some(tokens.token.clone());
        user.refresh_token = Some(tokens.refresh_token.clone());
        self.users.create(&user).await?;

        audit_log(&AuditEvent::Signup {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            role: user.user_type.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });
        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(AuthenticatedSession {
            user: user.to_public(),
            tokens,
        })
    }

    /// Log in with email and password
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientInfo,
    ) -> Result<AuthenticatedSession, AppError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            self.login_rejected(&request.email, "unknown email", client);
            return Err(AppError::InvalidCredentials(INVALID_LOGIN.to_string()));
        };

        if !self.verify(request.password, user.password.clone()).await? {
            self.login_rejected(&request.email, "wrong password", client);
            return Err(AppError::InvalidCredentials(INVALID_LOGIN.to_string()));
        }

        let tokens = self.tokens.issue(&subject_of(&user))?;
        let user = self.users.upsert_tokens(&user.user_id, &tokens).await?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(AuthenticatedSession {
            user: user.to_public(),
            tokens,
        })
    }

    /// Exchange a valid access/refresh pair for a fresh one
    ///
    /// `subject_id` is the caller established by the gate; the access token
    /// must name it. The new pair is only returned once it has been stored,
    /// so a failed write leaves the previous pair in place.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
        subject_id: &str,
        client: &ClientInfo,
    ) -> Result<AuthenticatedSession, AppError> {
        let claims = self.tokens.validate(access_token)?;
        if claims.sub != subject_id {
            return Err(AppError::InvalidCredentials(
                "access token does not belong to the caller".to_string(),
            ));
        }

        self.tokens
            .validate_refresh(refresh_token)
            .map_err(|e| AppError::InvalidCredentials(format!("refresh token: {e}")))?;

        let user = self
            .users
            .find_by_id(subject_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {subject_id} not found")))?;

        let tokens: TokenPair = self.tokens.issue(&subject_of(&user))?;
        let user = self.users.upsert_tokens(&user.user_id, &tokens).await?;

        audit_log(&AuditEvent::TokenRefresh {
            user_id: user.user_id.clone(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(AuthenticatedSession {
            user: user.to_public(),
            tokens,
        })
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserPublic, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.to_public())
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))
    }

    pub async fn list_users(
        &self,
        window: PageWindow,
    ) -> Result<PaginatedResult<UserPublic>, AppError> {
        let page = self.users.list(window).await?;
        Ok(page.map(|user| user.to_public()))
    }

    // Argon2 is CPU bound; keep it off the async workers.
    async fn hash(&self, password: String) -> Result<String, AppError> {
        let config = self.passwords;
        tokio::task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
            .map_err(AppError::from)
    }

    async fn verify(&self, password: String, digest: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))?
            .map_err(AppError::from)
    }

    fn signup_rejected(&self, email: &str, reason: &str, client: &ClientInfo) {
        audit_log(&AuditEvent::SignupFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: client.ip_address.clone(),
        });
    }

    fn login_rejected(&self, email: &str, reason: &str, client: &ClientInfo) {
        audit_log(&AuditEvent::LoginFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });
    }
}

fn subject_of(user: &User) -> TokenSubject<'_> {
    TokenSubject {
        subject_id: &user.user_id,
        email: &user.email,
        display_name: &user.name,
        username: &user.username,
        role: user.user_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::auth::models::UserRole;
    use cinedex_store::MemoryDocumentStore;
    use std::time::Duration;

    fn service() -> AuthService {
        let users = UserRepository::new(
            Arc::new(MemoryDocumentStore::new()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        let tokens = Arc::new(TokenService::new(JwtConfig::new("service-secret")).unwrap());
        AuthService::new(users, tokens).with_password_config(PasswordConfig::fast())
    }

    fn signup_request(email: &str, username: &str) -> SignupRequest {
        SignupRequest {
            name: "Ada Lovelace".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "Analytical1!".to_string(),
            user_type: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = service();
        let client = ClientInfo::default();

        let session = auth
            .signup(signup_request("ada@example.com", "ada"), &client)
            .await
            .unwrap();
        assert_eq!(session.user.user_type, UserRole::User);

        let login = auth
            .login(
                LoginRequest {
                    email: "ada@example.com".to_string(),
                    password: "Analytical1!".to_string(),
                },
                &client,
            )
            .await
            .unwrap();
        assert_eq!(login.user.user_id, session.user.user_id);
        assert_ne!(login.tokens, session.tokens);

        let stored = auth
            .users()
            .find_by_id(&session.user.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.token.as_deref(), Some(login.tokens.token.as_str()));
        assert!(stored.password.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_duplicate_email_and_username() {
        let auth = service();
        let client = ClientInfo::default();
        auth.signup(signup_request("ada@example.com", "ada"), &client)
            .await
            .unwrap();

        let email = auth
            .signup(signup_request("ADA@example.com", "other"), &client)
            .await;
        assert!(matches!(email, Err(AppError::Duplicate(_))));

        let username = auth
            .signup(signup_request("grace@example.com", "ada"), &client)
            .await;
        assert!(matches!(username, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let auth = service();
        let mut request = signup_request("ada@example.com", "ada");
        request.password = "alllowercase".to_string();

        let result = auth.signup(request, &ClientInfo::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        let client = ClientInfo::default();
        auth.signup(signup_request("ada@example.com", "ada"), &client)
            .await
            .unwrap();

        let unknown = auth
            .login(
                LoginRequest {
                    email: "nobody@example.com".to_string(),
                    password: "Analytical1!".to_string(),
                },
                &client,
            )
            .await
            .unwrap_err();
        let wrong = auth
            .login(
                LoginRequest {
                    email: "ada@example.com".to_string(),
                    password: "Wrong-password1".to_string(),
                },
                &client,
            )
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(wrong, AppError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair() {
        let auth = service();
        let client = ClientInfo::default();
        let session = auth
            .signup(signup_request("ada@example.com", "ada"), &client)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let refreshed = auth
            .refresh(
                &session.tokens.token,
                &session.tokens.refresh_token,
                &session.user.user_id,
                &client,
            )
            .await
            .unwrap();
        assert_ne!(refreshed.tokens, session.tokens);

        let stored = auth
            .users()
            .find_by_id(&session.user.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.refresh_token.as_deref(),
            Some(refreshed.tokens.refresh_token.as_str())
        );
        // The session reflects the record as written
        assert_eq!(refreshed.user.updated_at, stored.updated_at);
        assert!(refreshed.user.updated_at > session.user.updated_at);
    }

    #[tokio::test]
    async fn test_refresh_rejects_foreign_access_token() {
        let auth = service();
        let client = ClientInfo::default();
        let session = auth
            .signup(signup_request("ada@example.com", "ada"), &client)
            .await
            .unwrap();

        let result = auth
            .refresh(
                &session.tokens.token,
                &session.tokens.refresh_token,
                "someone-else",
                &client,
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidCredentials(_))));

        let garbage_refresh = auth
            .refresh(
                &session.tokens.token,
                "garbage",
                &session.user.user_id,
                &client,
            )
            .await;
        assert!(matches!(garbage_refresh, Err(AppError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_list_users_hides_credentials() {
        let auth = service();
        let client = ClientInfo::default();
        for i in 0..3 {
            auth.signup(
                signup_request(&format!("user{i}@example.com"), &format!("user{i}")),
                &client,
            )
            .await
            .unwrap();
        }

        let page = auth.list_users(PageWindow::new(2, 1)).await.unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].username, "user0");
    }
}
