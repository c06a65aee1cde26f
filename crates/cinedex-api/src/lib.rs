//! Cinedex API - REST server for the movie catalog
//!
//! Accounts with JWT sessions, genres, movies and reviews over a pluggable
//! document store. Every list endpoint is paginated with
//! `recordPerPage` / `page` / `startIndex`.

pub mod audit;
pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use cinedex_core::ServerConfig;
use handlers::{genres, health, movies, reviews, users};
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Cinedex API", description = "Movie catalog with JWT sessions"),
    paths(
        health::health_check,
        health::metrics,
        users::signup,
        users::login,
        users::refresh,
        users::list_users,
        users::get_user,
        genres::create_genre,
        genres::get_genre,
        genres::list_genres,
        genres::search_genres,
        genres::update_genre,
        genres::delete_genre,
        movies::create_movie,
        movies::get_movie,
        movies::list_movies,
        movies::search_movies,
        movies::movies_by_genre,
        movies::update_movie,
        reviews::add_review,
        reviews::reviews_for_movie,
        reviews::reviews_by_user,
        reviews::edit_review,
        reviews::delete_review,
    ),
    components(schemas(
        error::ApiError,
        health::HealthResponse,
        health::MetricsResponse,
        auth::SignupRequest,
        auth::LoginRequest,
        auth::RefreshRequest,
        auth::AuthenticatedSession,
        auth::UserPublic,
        auth::TokenPair,
        auth::UserRole,
        genres::GenreRequest,
        movies::CreateMovieRequest,
        movies::UpdateMovieRequest,
        reviews::AddReviewRequest,
        reviews::EditReviewRequest,
        cinedex_core::Genre,
        cinedex_core::Movie,
        cinedex_core::Review,
    )),
    tags(
        (name = "health", description = "Liveness and counters"),
        (name = "users", description = "Accounts and sessions"),
        (name = "genres", description = "Genre catalog"),
        (name = "movies", description = "Movie catalog"),
        (name = "reviews", description = "Movie reviews"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(routes::api_routes(&state))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::metrics_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configured origins only; an empty list allows any origin
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if !config.cors_enabled {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(auth::TOKEN_HEADER),
        ])
}

/// Signing secret used by [`create_router_for_testing`]
#[cfg(feature = "test-utils")]
pub const TEST_JWT_SECRET: &str = "cinedex-test-secret";

/// Application state over `store` with a fixed test secret and cheap
/// password hashing
#[cfg(feature = "test-utils")]
pub fn create_state_for_testing(
    store: Arc<dyn cinedex_store::DocumentStore>,
) -> Result<AppState, error::AppError> {
    let mut config = cinedex_core::AppConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();

    Ok(AppState::new(config, store)?.with_password_config(auth::PasswordConfig::fast()))
}

/// Router over a fresh in-memory store
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    let store = Arc::new(cinedex_store::MemoryDocumentStore::new());
    match create_state_for_testing(store) {
        Ok(state) => create_router(Arc::new(state)),
        Err(e) => panic!("test state could not be built: {e}"),
    }
}
