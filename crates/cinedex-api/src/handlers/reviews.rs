//! Review handlers
//!
//! Reviews belong to the USER who wrote them: the author id always comes
//! from the access token, never from the request body. Edit and delete are
//! open to the author or an ADMIN.
//!
//! Author: hephaex@gmail.com

use crate::auth::{authorize_role, authorize_self_or_role, AuthenticatedUser, UserRole};
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
use cinedex_core::Review;
use cinedex_store::Filter;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddReviewRequest {
    #[validate(length(min = 1, message = "review must not be empty"))]
    pub review: String,

    #[validate(length(min = 1, message = "movie_id is required"))]
    pub movie_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EditReviewRequest {
    #[validate(length(min = 1, message = "review must not be empty"))]
    pub review: String,
}

async fn load_review(state: &AppState, review_id: &str) -> Result<Review, AppError> {
    state
        .reviews
        .get(review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {review_id} not found")))
}

/// Review a movie (USER only)
#[utoipa::path(
    post,
    path = "/review/add-review",
    tag = "reviews",
    request_body = AddReviewRequest,
    params(("token" = String, Header, description = "Access token")),
    responses(
        (status = 201, description = "Review added", body = Review),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 403, description = "Caller is not USER", body = crate::error::ApiError),
        (status = 404, description = "No such movie", body = crate::error::ApiError),
    )
)]
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<AddReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_role(&caller, UserRole::User)?;

    state.movies.require(&request.movie_id).await?;

    let review = Review::new(request.review, request.movie_id, caller.user_id);
    state.reviews.insert(&review.review_id, &review).await?;
    tracing::info!(
        review_id = %review.review_id,
        movie_id = %review.movie_id,
        "Review added"
    );

    Ok((StatusCode::CREATED, Json(review)))
}

/// Reviews of one movie
#[utoipa::path(
    get,
    path = "/review/filter/{movie_id}",
    tag = "reviews",
    params(
        ("movie_id" = String, Path, description = "Movie id"),
        PageQuery,
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "One page of reviews", body = Object),
    )
)]
pub async fn reviews_for_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = Filter::all().eq("movie_id", movie_id);
    let page = state.reviews.paginate(&filter, query.window()).await?;
    Ok(Json(page))
}

/// Reviews written by one user (that user or an ADMIN)
#[utoipa::path(
    get,
    path = "/review/user_reviews/{reviewer_id}",
    tag = "reviews",
    params(
        ("reviewer_id" = String, Path, description = "Author's user id"),
        PageQuery,
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "One page of reviews", body = Object),
        (status = 403, description = "Not the author and not ADMIN", body = crate::error::ApiError),
    )
)]
pub async fn reviews_by_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(reviewer_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize_self_or_role(&caller, &reviewer_id, UserRole::Admin)?;

    let filter = Filter::all().eq("reviewer_id", reviewer_id);
    let page = state.reviews.paginate(&filter, query.window()).await?;
    Ok(Json(page))
}

/// Edit a review's text (author or ADMIN)
#[utoipa::path(
    put,
    path = "/reviews/edit-review/{review_id}",
    tag = "reviews",
    request_body = EditReviewRequest,
    params(
        ("review_id" = String, Path, description = "Review id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not the author and not ADMIN", body = crate::error::ApiError),
        (status = 404, description = "No such review", body = crate::error::ApiError),
    )
)]
pub async fn edit_review(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(review_id): Path<String>,
    ValidatedJson(request): ValidatedJson<EditReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let existing = load_review(&state, &review_id).await?;
    authorize_self_or_role(&caller, &existing.reviewer_id, UserRole::Admin)?;

    let patch = json!({ "review": request.review, "updated_at": Utc::now() });
    let review = state
        .reviews
        .update(&review_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {review_id} not found")))?;

    Ok(Json(review))
}

/// Delete a review (author or ADMIN)
#[utoipa::path(
    delete,
    path = "/review/delete/{review_id}",
    tag = "reviews",
    params(
        ("review_id" = String, Path, description = "Review id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the author and not ADMIN", body = crate::error::ApiError),
        (status = 404, description = "No such review", body = crate::error::ApiError),
    )
)]
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(review_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let existing = load_review(&state, &review_id).await?;
    authorize_self_or_role(&caller, &existing.reviewer_id, UserRole::Admin)?;

    if !state.reviews.delete(&review_id).await? {
        return Err(AppError::NotFound(format!("review {review_id} not found")));
    }

    tracing::info!(review_id = %review_id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}
