//! Genre handlers
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
use cinedex_core::Genre;
use cinedex_store::Filter;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Genre create/update body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenreRequest {
    #[validate(length(min = 4, max = 100, message = "name must be 4-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenreSearchQuery {
    /// Case-insensitive substring of the genre name
    #[serde(rename = "genre-name")]
    pub genre_name: Option<String>,
}

async fn ensure_name_free(
    state: &AppState,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), AppError> {
    let mut filter = Filter::all().eq_ignore_case("name", name);
    if let Some(genre_id) = except_id {
        filter = filter.ne("genre_id", genre_id);
    }

    if state.genres.exists(&filter).await? {
        return Err(AppError::Duplicate(format!("genre '{name}' already exists")));
    }
    Ok(())
}

/// Create a genre (ADMIN only)
#[utoipa::path(
    post,
    path = "/genres/creategenre",
    tag = "genres",
    request_body = GenreRequest,
    params(("token" = String, Header, description = "Access token")),
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid name", body = crate::error::ApiError),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
        (status = 409, description = "Name already used", body = crate::error::ApiError),
    )
)]
pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<GenreRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_role(&caller, UserRole::Admin)?;
    ensure_name_free(&state, &request.name, None).await?;

    let genre = Genre::new(request.name);
    state.genres.insert(&genre.genre_id, &genre).await?;
    tracing::info!(genre_id = %genre.genre_id, name = %genre.name, "Genre created");

    Ok((StatusCode::CREATED, Json(genre)))
}

#[utoipa::path(
    get,
    path = "/genres/{genre_id}",
    tag = "genres",
    params(
        ("genre_id" = String, Path, description = "Genre id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "Genre found", body = Genre),
        (status = 404, description = "No such genre", body = crate::error::ApiError),
    )
)]
pub async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(genre_id): Path<String>,
) -> Result<Json<Genre>, AppError> {
    Ok(Json(state.genres.require(&genre_id).await?))
}

/// List genres (ADMIN only, paginated)
#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    params(PageQuery, ("token" = String, Header, description = "Access token")),
    responses(
        (status = 200, description = "One page of genres", body = Object),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
    )
)]
pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize_role(&caller, UserRole::Admin)?;

    let page = state.genres.paginate(&Filter::all(), query.window()).await?;
    Ok(Json(page))
}

/// Search genres by name
#[utoipa::path(
    get,
    path = "/genres/search",
    tag = "genres",
    params(GenreSearchQuery, ("token" = String, Header, description = "Access token")),
    responses(
        (status = 200, description = "Matching genres", body = [Genre]),
        (status = 400, description = "genre-name missing", body = crate::error::ApiError),
        (status = 404, description = "Nothing matched", body = crate::error::ApiError),
    )
)]
pub async fn search_genres(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenreSearchQuery>,
) -> Result<Json<Vec<Genre>>, AppError> {
    let name = query
        .genre_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation("Please provide a genre name to search".to_string()))?;

    let genres = state
        .genres
        .find(&Filter::all().contains_ignore_case("name", name))
        .await?;

    if genres.is_empty() {
        return Err(AppError::NotFound(format!("no genres match '{name}'")));
    }
    Ok(Json(genres))
}

/// Rename a genre (ADMIN only)
#[utoipa::path(
    put,
    path = "/genres/{genre_id}",
    tag = "genres",
    request_body = GenreRequest,
    params(
        ("genre_id" = String, Path, description = "Genre id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
        (status = 404, description = "No such genre", body = crate::error::ApiError),
        (status = 409, description = "Name already used", body = crate::error::ApiError),
    )
)]
pub async fn update_genre(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(genre_id): Path<String>,
    ValidatedJson(request): ValidatedJson<GenreRequest>,
) -> Result<Json<Genre>, AppError> {
    authorize_role(&caller, UserRole::Admin)?;
    ensure_name_free(&state, &request.name, Some(&genre_id)).await?;

    let patch = json!({ "name": request.name, "updated_at": Utc::now() });
    let genre = state
        .genres
        .update(&genre_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("genre {genre_id} not found")))?;

    Ok(Json(genre))
}

/// Delete a genre (ADMIN only)
#[utoipa::path(
    delete,
    path = "/genres/{genre_id}",
    tag = "genres",
    params(
        ("genre_id" = String, Path, description = "Genre id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
        (status = 404, description = "No such genre", body = crate::error::ApiError),
    )
)]
pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(genre_id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize_role(&caller, UserRole::Admin)?;

    if !state.genres.delete(&genre_id).await? {
        return Err(AppError::NotFound(format!("genre {genre_id} not found")));
    }

    tracing::info!(genre_id = %genre_id, "Genre deleted");
    Ok(StatusCode::NO_CONTENT)
}
