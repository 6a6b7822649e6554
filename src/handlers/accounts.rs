use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use model::entities::{
    account::{self, AccountKind},
    prelude::Account,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a new account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Account name, unique per user (case-insensitive)
    pub name: String,
    /// Account kind: Checking, Savings, CreditCard, Cash or Other
    pub kind: String,
    /// Opening balance (default: 0)
    pub balance: Option<Decimal>,
}

/// Request body for updating an account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub balance: Option<Decimal>,
}

/// Account response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub name: String,
    pub kind: String,
    pub balance: Decimal,
    pub owner_id: i32,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: format!("{:?}", model.kind),
            balance: model.balance,
            owner_id: model.owner_id,
        }
    }
}

// Helper function to parse kind string to AccountKind enum
fn parse_account_kind(kind: &str) -> ApiResult<AccountKind> {
    match kind {
        "Checking" => Ok(AccountKind::Checking),
        "Savings" => Ok(AccountKind::Savings),
        "CreditCard" => Ok(AccountKind::CreditCard),
        "Cash" => Ok(AccountKind::Cash),
        "Other" => Ok(AccountKind::Other),
        other => Err(ApiError::Validation(format!(
            "Invalid account kind: {other}"
        ))),
    }
}

/// Resolves an account that must belong to the requesting user. Missing and
/// not-owned are the same 404.
pub(crate) async fn find_owned_account(
    db: &DatabaseConnection,
    owner_id: i32,
    account_id: i32,
) -> ApiResult<account::Model> {
    Account::find_by_id(account_id)
        .filter(account::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))
}

/// Checks the per-user case-insensitive name uniqueness rule.
async fn ensure_name_available(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
    exclude_id: Option<i32>,
) -> ApiResult<()> {
    let accounts = Account::find()
        .filter(account::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?;
    let taken = accounts
        .iter()
        .any(|a| Some(a.id) != exclude_id && a.name.eq_ignore_ascii_case(name));
    if taken {
        warn!(owner_id, name, "duplicate account name");
        return Err(ApiError::Conflict(
            "You already have an account with this name".to_string(),
        ));
    }
    Ok(())
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Duplicate account name", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AccountResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Account name is required".to_string()));
    }
    let kind = parse_account_kind(&request.kind)?;
    ensure_name_available(&state.db, auth.id, name, None).await?;

    let created = account::ActiveModel {
        name: Set(name.to_string()),
        kind: Set(kind),
        balance: Set(request.balance.unwrap_or(Decimal::ZERO)),
        owner_id: Set(auth.id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(account_id = created.id, owner_id = auth.id, "account created");
    let response = ApiResponse {
        data: AccountResponse::from(created),
        message: "Account created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all accounts of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountResponse>>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<AccountResponse>>>> {
    let accounts = Account::find()
        .filter(account::Column::OwnerId.eq(auth.id))
        .order_by_asc(account::Column::Name)
        .all(&state.db)
        .await?;

    let response = ApiResponse {
        data: accounts.into_iter().map(AccountResponse::from).collect(),
        message: "Accounts retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<AccountResponse>>> {
    let account = find_owned_account(&state.db, auth.id, account_id).await?;

    let response = ApiResponse {
        data: AccountResponse::from(account),
        message: "Account retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Duplicate account name", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<Json<ApiResponse<AccountResponse>>> {
    let existing = find_owned_account(&state.db, auth.id, account_id).await?;

    let mut active: account::ActiveModel = existing.into();
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation("Account name is required".to_string()));
        }
        ensure_name_available(&state.db, auth.id, &name, Some(account_id)).await?;
        active.name = Set(name);
    }
    if let Some(kind) = request.kind {
        active.kind = Set(parse_account_kind(&kind)?);
    }
    if let Some(balance) = request.balance {
        active.balance = Set(balance);
    }

    let updated = active.update(&state.db).await?;
    info!(account_id = updated.id, "account updated");

    let response = ApiResponse {
        data: AccountResponse::from(updated),
        message: "Account updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete an account
///
/// Transactions that referenced the account keep existing with the account
/// reference nulled out.
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Account not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let account = find_owned_account(&state.db, auth.id, account_id).await?;
    account.delete(&state.db).await?;

    info!(account_id, owner_id = auth.id, "account deleted");
    let response = ApiResponse {
        data: format!("Account {account_id} deleted"),
        message: "Account deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
