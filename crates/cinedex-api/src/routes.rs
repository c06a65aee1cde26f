//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::middleware::auth_middleware;
use crate::handlers::{genres, movies, reviews, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Catalog and account routes
///
/// Signup and login are public. Every other route sits behind the access
/// gate, which rejects before the handler runs.
pub fn api_routes(state: &AppState) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login));

    let protected_routes = Router::new()
        // Users
        .route("/users/refresh", post(users::refresh))
        .route("/users", get(users::list_users))
        .route("/users/:user_id", get(users::get_user))
        // Genres
        .route("/genres/creategenre", post(genres::create_genre))
        .route("/genres", get(genres::list_genres))
        .route("/genres/search", get(genres::search_genres))
        .route(
            "/genres/:genre_id",
            get(genres::get_genre)
                .put(genres::update_genre)
                .delete(genres::delete_genre),
        )
        // Movies
        .route("/movies/create-movie", post(movies::create_movie))
        .route("/movies", get(movies::list_movies))
        .route("/movies/search/:movie_name", get(movies::search_movies))
        .route("/movies/filter/:genre_id", get(movies::movies_by_genre))
        .route(
            "/movies/:movie_id",
            get(movies::get_movie).put(movies::update_movie),
        )
        // Reviews
        .route("/review/add-review", post(reviews::add_review))
        .route("/review/filter/:movie_id", get(reviews::reviews_for_movie))
        .route(
            "/review/user_reviews/:reviewer_id",
            get(reviews::reviews_by_user),
        )
        .route("/reviews/edit-review/:review_id", put(reviews::edit_review))
        .route("/review/delete/:review_id", delete(reviews::delete_review))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}
