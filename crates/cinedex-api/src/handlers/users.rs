//! User account handlers
//!
//! Signup and login are public; everything else sits behind the access gate.
//!
//! Author: hephaex@gmail.com

use crate::audit::ClientInfo;
use crate::auth::{
    authorize_role, authorize_self_or_role, token_from_headers, AuthenticatedSession,
    AuthenticatedUser, LoginRequest, RefreshRequest, SignupRequest, UserPublic, UserRole,
};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::handlers::params::PageQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Register a new user account
///
/// Creates the account and returns it together with its first token pair.
/// `user_type` defaults to USER.
///
/// # Responses
///
/// * `201 Created` - Account created
/// * `400 Bad Request` - Invalid input or weak password
/// * `409 Conflict` - Email or username already taken
#[utoipa::path(
    post,
    path = "/users/signup",
    tag = "users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = AuthenticatedSession),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Email or username taken", body = crate::error::ApiError),
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = ClientInfo::from_headers(&headers);
    let session = state.auth.signup(request, &client).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthenticatedSession),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Invalid email or password", body = crate::error::ApiError),
        (status = 504, description = "Token persistence timed out", body = crate::error::ApiError),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthenticatedSession>, AppError> {
    let client = ClientInfo::from_headers(&headers);
    let session = state.auth.login(request, &client).await?;

    Ok(Json(session))
}

/// Exchange the current token pair for a new one
///
/// The access token comes from the `token` header, the refresh token from
/// the body. The stored pair only changes once the new one is persisted.
#[utoipa::path(
    post,
    path = "/users/refresh",
    tag = "users",
    request_body = RefreshRequest,
    params(("token" = String, Header, description = "Access token")),
    responses(
        (status = 200, description = "New token pair", body = AuthenticatedSession),
        (status = 400, description = "Missing token header", body = crate::error::ApiError),
        (status = 401, description = "Invalid or expired token", body = crate::error::ApiError),
        (status = 500, description = "Token pair could not be stored", body = crate::error::ApiError),
        (status = 504, description = "Token persistence timed out", body = crate::error::ApiError),
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<AuthenticatedSession>, AppError> {
    let access_token = token_from_headers(&headers)?;

    let client = ClientInfo::from_headers(&headers);
    let session = state
        .auth
        .refresh(access_token, &request.refresh_token, &caller.user_id, &client)
        .await?;

    Ok(Json(session))
}

/// List users (ADMIN only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(PageQuery, ("token" = String, Header, description = "Access token")),
    responses(
        (status = 200, description = "One page of users", body = Object),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ApiError),
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize_role(&caller, UserRole::Admin)?;

    let page = state.auth.list_users(query.window()).await?;
    Ok(Json(page))
}

/// Fetch one user (the user themself or an ADMIN)
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("token" = String, Header, description = "Access token")
    ),
    responses(
        (status = 200, description = "User found", body = UserPublic),
        (status = 403, description = "Not the owner and not ADMIN", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPublic>, AppError> {
    authorize_self_or_role(&caller, &user_id, UserRole::Admin)?;

    let user = state.auth.get_user(&user_id).await?;
    Ok(Json(user))
}
