use axum::{extract::State, http::StatusCode, response::Json, Extension};
use model::entities::{prelude::User, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for signing up a new user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
}

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
}

/// Identity response carrying the bearer token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthTokenResponse {
    pub id: i32,
    pub username: String,
    /// Opaque bearer token for the Authorization header
    pub token: String,
}

/// Current-user response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
}

/// Sign up a new user and issue their API token
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<AuthTokenResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Username already taken", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthTokenResponse>>)> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation("Username is required".to_string()));
    }

    let existing = User::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        warn!(username, "signup rejected: username taken");
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    let created = user::ActiveModel {
        username: Set(username.to_string()),
        api_token: Set(Uuid::new_v4().simple().to_string()),
        password_reset_token: Set(None),
        password_reset_expires_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(user_id = created.id, "user created");
    let response = ApiResponse {
        data: AuthTokenResponse {
            id: created.id,
            username: created.username,
            token: created.api_token,
        },
        message: "User created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange a username for the stored API token
///
/// Credential verification is delegated to whatever identity provider fronts
/// the API; this endpoint only resolves the account and hands back its token.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthTokenResponse>),
        (status = 401, description = "Unknown user", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokenResponse>>> {
    let user = User::find()
        .filter(user::Column::Username.eq(request.username.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    info!(user_id = user.id, "user logged in");
    let response = ApiResponse {
        data: AuthTokenResponse {
            id: user.id,
            username: user.username,
            token: user.api_token,
        },
        message: "Login successful".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = User::find_by_id(auth.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let response = ApiResponse {
        data: UserResponse {
            id: user.id,
            username: user.username,
        },
        message: "User retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
