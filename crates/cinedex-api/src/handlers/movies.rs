//! Movie handlers
//!
//! Author: hephaex@gmail.com

use crate::auth::{authorize_role, AuthenticatedUser, UserRole};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::handlers::params::PageQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use cinedex_core::{Genre, Movie};
use cinedex_store::Filter;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "topic is required"))]
    pub topic: String,

    #[validate(url(message = "movie_url must be a valid URL"))]
    pub movie_url: Option<String>,

    /// Optional; must name an existing genre when set
    #[serde(default)]
    pub genre_id: String,
}

/// Partial movie update; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMovieRequest {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: Option<String>,

    #[validate(url(message = "movie_url must be a valid URL"))]
    pub movie_url: Option<String>,

    pub genre_id: Option<String>,
}

impl UpdateMovieRequest {
    fn into_patch(self) -> Option<Value> {
        let mut patch = Map::new();
        if let Some(name) = self.name {
            patch.insert("name".into(), Value::String(name));
        }
        if let Some(topic) = self.topic {
            patch.insert("topic".into(), Value::String(topic));
        }
        if let Some(url) = self.movie_url {
            patch.insert("movie_url".into(), Value::String(url));
        }
        if let Some(genre_id) = self.genre_id {
            patch.insert("genre_id".into(), Value::String(genre_id));
        }

        if patch.is_empty() {
            return None;
        }
        patch.insert("updated_at".into(), serde_json::json!(Utc::now()));
        Some(Value::Object(patch))
    }
}

async fn ensure_genre_exists(state: &AppState, genre_id: &str) -> Result<(), AppError> {
    if genre_id.is_empty() {
        return Ok(());
    }
    if state.genres.get(genre_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "{} {genre_id} does not exist",
            Genre::COLLECTION
        )));
    }
    Ok(())
}

/// Create a movie (ADMIN only)
#[utoipa::path(
    post,
    path = "/movies/create-movie",
    tag = "movies",
    request_body = CreateMovieRequest,
    params(("token" = String, Header, description = "Access token")),
    responses(
        (status = 201, description = "Movie created", body = Movie),
        (status = 400, description = "Invalid input or unknown genre", body = crate::error::ApiError),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
        (status = 409, description = "Name already used", body = crate::error::ApiError),
    )
)]
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_role(&caller, UserRole::Admin)?;

    let taken = state
        .movies
        .exists(&Filter::all().eq_ignore_case("name", &request.name))
        .await?;
    if taken {
        return Err(AppError::Duplicate(format!(
            "movie '{}' already exists",
            request.name
        )));
    }
    ensure_genre_exists(&state, &request.genre_id).await?;

    let movie = Movie::new(
        request.name,
        request.topic,
        request.movie_url,
        request.genre_id,
    );
    state.movies.insert(&movie.movie_id, &movie).await?;
    tracing::info!(movie_id = %movie.movie_id, "Movie created");

    Ok((StatusCode::CREATED, Json(movie)))
}

#[utoipa::path(
    get,
    path = "/movies/{movie_id}",
    tag = "movies",
    params(
        ("movie_id" = String, Path, description = "Movie id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "Movie found", body = Movie),
        (status = 404, description = "No such movie", body = crate::error::ApiError),
    )
)]
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<String>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(state.movies.require(&movie_id).await?))
}

#[utoipa::path(
    get,
    path = "/movies",
    tag = "movies",
    params(PageQuery, ("token" = String, Header, description = "Access token")),
    responses(
        (status = 200, description = "One page of movies", body = Object),
    )
)]
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.movies.paginate(&Filter::all(), query.window()).await?;
    Ok(Json(page))
}

/// Movies whose name contains `movie_name`, ignoring case
#[utoipa::path(
    get,
    path = "/movies/search/{movie_name}",
    tag = "movies",
    params(
        ("movie_name" = String, Path, description = "Name fragment"),
        PageQuery,
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "One page of matches", body = Object),
        (status = 404, description = "Nothing matched", body = crate::error::ApiError),
    )
)]
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Path(movie_name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = Filter::all().contains_ignore_case("name", movie_name.trim());
    let page = state.movies.paginate(&filter, query.window()).await?;

    if page.is_empty() {
        return Err(AppError::NotFound(format!("no movies match '{movie_name}'")));
    }
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/movies/filter/{genre_id}",
    tag = "movies",
    params(
        ("genre_id" = String, Path, description = "Genre id"),
        PageQuery,
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "One page of movies in the genre", body = Object),
    )
)]
pub async fn movies_by_genre(
    State(state): State<Arc<AppState>>,
    Path(genre_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = Filter::all().eq("genre_id", genre_id);
    let page = state.movies.paginate(&filter, query.window()).await?;
    Ok(Json(page))
}

/// Update a movie (ADMIN only)
#[utoipa::path(
    put,
    path = "/movies/{movie_id}",
    tag = "movies",
    request_body = UpdateMovieRequest,
    params(
        ("movie_id" = String, Path, description = "Movie id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "Movie updated", body = Movie),
        (status = 400, description = "Nothing to update or invalid input", body = crate::error::ApiError),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
        (status = 404, description = "No such movie", body = crate::error::ApiError),
        (status = 409, description = "Name already used", body = crate::error::ApiError),
    )
)]
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(movie_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateMovieRequest>,
) -> Result<Json<Movie>, AppError> {
    authorize_role(&caller, UserRole::Admin)?;

    if let Some(name) = &request.name {
        let filter = Filter::all()
            .eq_ignore_case("name", name.as_str())
            .ne("movie_id", movie_id.as_str());
        if state.movies.exists(&filter).await? {
            return Err(AppError::Duplicate(format!("movie '{name}' already exists")));
        }
    }
    if let Some(genre_id) = &request.genre_id {
        ensure_genre_exists(&state, genre_id).await?;
    }

    let patch = request
        .into_patch()
        .ok_or_else(|| AppError::Validation("no fields to update".to_string()))?;

    let movie = state
        .movies
        .update(&movie_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {movie_id} not found")))?;

    Ok(Json(movie))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_has_no_patch() {
        assert!(UpdateMovieRequest::default().into_patch().is_none());
    }

    #[test]
    fn test_update_patch_only_carries_given_fields() {
        let patch = UpdateMovieRequest {
            topic: Some("heist".to_string()),
            ..Default::default()
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch["topic"], "heist");
        assert!(patch.get("name").is_none());
        assert!(patch.get("updated_at").is_some());
    }

    #[test]
    fn test_movie_url_must_be_url() {
        let request = CreateMovieRequest {
            name: "Heat".to_string(),
            topic: "crime".to_string(),
            movie_url: Some("not a url".to_string()),
            genre_id: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
