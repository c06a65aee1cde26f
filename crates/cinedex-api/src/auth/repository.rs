//! Credential store
//!
//! User account persistence over the `user` collection of the document
//! store. Token pair writes use their own, shorter deadline.

use super::models::{TokenPair, User};
use chrono::Utc;
use cinedex_core::{CinedexError, Result};
use cinedex_store::{Collection, DocumentStore, Filter, PageWindow, PaginatedResult};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// User repository
#[derive(Debug, Clone)]
pub struct UserRepository {
    users: Collection<User>,
    token_deadline: Duration,
}

impl UserRepository {
    /// Create a repository
    ///
    /// * `store_deadline` - applies to reads and account creation
    /// * `token_deadline` - applies to token pair upserts
    pub fn new(
        store: Arc<dyn DocumentStore>,
        store_deadline: Duration,
        token_deadline: Duration,
    ) -> Self {
        Self {
            users: Collection::new(store, User::COLLECTION, store_deadline),
            token_deadline,
        }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        self.users.get(user_id).await
    }

    /// Email lookup is case-insensitive
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users
            .find_one(&Filter::all().eq_ignore_case("email", email))
            .await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.users
            .exists(&Filter::all().eq_ignore_case("email", email))
            .await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.users
            .exists(&Filter::all().eq_ignore_case("username", username))
            .await
    }

    pub async fn create(&self, user: &User) -> Result<()> {
        self.users.insert(&user.user_id, user).await
    }

    /// Store `tokens` as the user's current pair, stamping `updated_at`,
    /// and return the record as stored.
    ///
    /// Creates the record if it is absent. Either the whole pair is written
    /// or the call fails and the previous pair stays in place.
    pub async fn upsert_tokens(&self, user_id: &str, tokens: &TokenPair) -> Result<User> {
        let patch = json!({
            "user_id": user_id,
            "token": tokens.token,
            "refresh_token": tokens.refresh_token,
            "updated_at": Utc::now(),
        });

        let stored = self
            .users
            .with_timeout(self.token_deadline)
            .upsert(user_id, patch)
            .await?;
        serde_json::from_value(stored).map_err(CinedexError::from)
    }

    pub async fn list(&self, window: PageWindow) -> Result<PaginatedResult<User>> {
        self.users.paginate(&Filter::all(), window).await
    }
}
