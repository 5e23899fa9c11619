use service_core::{
    axum::{
        extract::{Path, State},
        http::{header, StatusCode},
        response::{IntoResponse, Response},
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    dtos::user::{UserCreateRequest, UserResponse, UserUpdateRequest},
    middleware::AuthUser,
    AppState,
};

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users found", body = Vec<UserResponse>),
        (status = 204, description = "No users"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Response, AppError> {
    let users = state.users.list_users().await?;
    if users.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.get_user(user_id).await?;
    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(req): Json<UserCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.register_user(req).await?;
    tracing::info!(user_id = %user.id, created_by = %identity.username, "User created via API");

    let location = format!("/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::from(user)),
    ))
}

/// Update the supplied fields of a user
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UserUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.update_user(user_id, req).await?;
    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

/// Delete a user
///
/// Succeeds whether or not the user existed.
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.users.delete_user(user_id).await? {
        tracing::debug!(user_id = %user_id, "Delete requested for unknown user");
    }
    Ok(StatusCode::NO_CONTENT)
}
