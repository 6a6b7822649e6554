use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use model::entities::{prelude::User, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::error::ApiError;
use crate::schemas::AppState;

/// The authenticated user of the current request, injected by
/// [`require_auth`] and read by handlers through `Extension<AuthUser>`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

/// Middleware guarding every `/api` route except signup and login.
///
/// Resolves the `Authorization: Bearer` token against the user table and
/// injects the matching [`AuthUser`]. Token issuance itself lives in the
/// identity handlers; this layer only checks presence and validity.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let user = User::find()
        .filter(user::Column::ApiToken.eq(token))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    debug!(user_id = user.id, "request authenticated");
    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(request).await)
}
