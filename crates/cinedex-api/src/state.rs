//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthService, JwtConfig, PasswordConfig, TokenService, UserRepository};
use crate::error::AppError;
use cinedex_core::{AppConfig, Genre, Movie, Review};
use cinedex_store::{Collection, DocumentStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Backing document store
    pub store: Arc<dyn DocumentStore>,
    /// Token service, also handed to the auth middleware
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub genres: Collection<Genre>,
    pub movies: Collection<Movie>,
    pub reviews: Collection<Review>,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
}

impl AppState {
    /// Build state from configuration and an already connected store
    ///
    /// Fails when no signing secret is configured.
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, AppError> {
        let tokens = Arc::new(TokenService::new(JwtConfig::try_from(&config.auth)?)?);

        let store_deadline = Duration::from_secs(config.database.timeout_secs);
        let token_deadline = Duration::from_secs(config.auth.refresh_timeout_secs);

        let users = UserRepository::new(store.clone(), store_deadline, token_deadline);
        let auth = AuthService::new(users, tokens.clone());

        Ok(Self {
            genres: Collection::new(store.clone(), Genre::COLLECTION, store_deadline),
            movies: Collection::new(store.clone(), Movie::COLLECTION, store_deadline),
            reviews: Collection::new(store.clone(), Review::COLLECTION, store_deadline),
            config,
            store,
            tokens,
            auth,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }

    /// Replace the Argon2 cost parameters (tests use cheap ones)
    pub fn with_password_config(mut self, passwords: PasswordConfig) -> Self {
        self.auth = self.auth.with_password_config(passwords);
        self
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
