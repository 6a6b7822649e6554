use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{NaiveDate, Utc};
use compute::debt::reconcile;
use model::entities::{
    debt::{self, DebtStatus},
    debtor, payment,
    prelude::{Debt, Debtor, Payment},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::accounts::find_owned_account;
use crate::handlers::categories::find_owned_category;
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a new debt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateDebtRequest {
    pub description: String,
    /// Total owed; zero is allowed and reconciles to PAID immediately
    pub total_amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub debtor_id: i32,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

/// Request body for updating a debt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateDebtRequest {
    pub description: Option<String>,
    pub total_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    /// "PENDING" or "PAID". Setting "PAID" settles the debt (once); setting
    /// "PENDING" on a settled debt is rejected — the latch is one-way.
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

/// Debt response model with reconciled figures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DebtResponse {
    pub id: i32,
    pub description: String,
    pub total_amount: Decimal,
    pub due_date: Option<NaiveDate>,
    /// Derived status: "Pending" or "Paid"
    pub status: String,
    pub debtor_id: i32,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
}

impl DebtResponse {
    /// Builds the response with figures derived from the payment rows.
    pub fn reconciled(debt: debt::Model, payments: &[payment::Model]) -> Self {
        let figures = reconcile(debt.total_amount, debt.status, payments);
        Self {
            id: debt.id,
            description: debt.description,
            total_amount: debt.total_amount,
            due_date: debt.due_date,
            status: format!("{:?}", figures.status),
            debtor_id: debt.debtor_id,
            category_id: debt.category_id,
            account_id: debt.account_id,
            paid_amount: figures.paid_amount,
            remaining_amount: figures.remaining_amount,
        }
    }
}

fn parse_debt_status(status: &str) -> ApiResult<DebtStatus> {
    match status.to_uppercase().as_str() {
        "PENDING" => Ok(DebtStatus::Pending),
        "PAID" => Ok(DebtStatus::Paid),
        other => Err(ApiError::Validation(format!(
            "Invalid status: {other}. Use PENDING or PAID"
        ))),
    }
}

/// Resolves a debt whose debtor belongs to the requesting user. Missing and
/// not-owned collapse into the same 404.
pub(crate) async fn find_owned_debt(
    db: &DatabaseConnection,
    owner_id: i32,
    debt_id: i32,
) -> ApiResult<(debt::Model, debtor::Model)> {
    let debt = Debt::find_by_id(debt_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Debt"))?;
    let debtor = Debtor::find_by_id(debt.debtor_id)
        .filter(debtor::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Debt"))?;
    Ok((debt, debtor))
}

async fn check_links(
    db: &DatabaseConnection,
    owner_id: i32,
    category_id: Option<i32>,
    account_id: Option<i32>,
) -> ApiResult<()> {
    if let Some(category_id) = category_id {
        find_owned_category(db, owner_id, category_id).await?;
    }
    if let Some(account_id) = account_id {
        find_owned_account(db, owner_id, account_id).await?;
    }
    Ok(())
}

async fn debts_of_user(
    db: &DatabaseConnection,
    owner_id: i32,
) -> ApiResult<Vec<(debt::Model, Vec<payment::Model>)>> {
    let debtor_ids: Vec<i32> = Debtor::find()
        .filter(debtor::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    if debtor_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Debt::find()
        .filter(debt::Column::DebtorId.is_in(debtor_ids))
        .order_by_asc(debt::Column::Id)
        .find_with_related(Payment)
        .all(db)
        .await?)
}

/// Create a new debt
#[utoipa::path(
    post,
    path = "/api/v1/debts",
    tag = "debts",
    request_body = CreateDebtRequest,
    responses(
        (status = 201, description = "Debt created successfully", body = ApiResponse<DebtResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Debtor not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_debt(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateDebtRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DebtResponse>>)> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(ApiError::Validation("Description is required".to_string()));
    }
    if request.total_amount < Decimal::ZERO {
        return Err(ApiError::Validation(
            "Total amount must not be negative".to_string(),
        ));
    }

    let debtor =
        crate::handlers::debtors::find_owned_debtor(&state.db, auth.id, request.debtor_id).await?;
    check_links(&state.db, auth.id, request.category_id, request.account_id).await?;

    let created = debt::ActiveModel {
        description: Set(description.to_string()),
        total_amount: Set(request.total_amount),
        due_date: Set(request.due_date),
        status: Set(DebtStatus::Pending),
        debtor_id: Set(debtor.id),
        category_id: Set(request.category_id),
        account_id: Set(request.account_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(debt_id = created.id, debtor_id = debtor.id, "debt created");
    let response = ApiResponse {
        data: DebtResponse::reconciled(created, &[]),
        message: "Debt created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all debts of the authenticated user, with reconciled figures
#[utoipa::path(
    get,
    path = "/api/v1/debts",
    tag = "debts",
    responses(
        (status = 200, description = "Debts retrieved successfully", body = ApiResponse<Vec<DebtResponse>>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<DebtResponse>>>> {
    let debts = debts_of_user(&state.db, auth.id).await?;

    let response = ApiResponse {
        data: debts
            .into_iter()
            .map(|(debt, payments)| DebtResponse::reconciled(debt, &payments))
            .collect(),
        message: "Debts retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific debt by ID
#[utoipa::path(
    get,
    path = "/api/v1/debts/{debt_id}",
    tag = "debts",
    params(
        ("debt_id" = i32, Path, description = "Debt ID"),
    ),
    responses(
        (status = 200, description = "Debt retrieved successfully", body = ApiResponse<DebtResponse>),
        (status = 404, description = "Debt not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debt(
    Path(debt_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<DebtResponse>>> {
    let (debt, _debtor) = find_owned_debt(&state.db, auth.id, debt_id).await?;
    let payments = debt.find_related(Payment).all(&state.db).await?;

    let response = ApiResponse {
        data: DebtResponse::reconciled(debt, &payments),
        message: "Debt retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get debts filtered by derived status
///
/// The filter runs on the reconciled status, so a zero-remaining debt shows
/// up under PAID even before its stored status caught up.
#[utoipa::path(
    get,
    path = "/api/v1/debts/status/{status}",
    tag = "debts",
    params(
        ("status" = String, Path, description = "PENDING or PAID"),
    ),
    responses(
        (status = 200, description = "Debts retrieved successfully", body = ApiResponse<Vec<DebtResponse>>),
        (status = 400, description = "Invalid status", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debts_by_status(
    Path(status): Path<String>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<DebtResponse>>>> {
    let wanted = parse_debt_status(&status)?;
    let wanted = format!("{wanted:?}");

    let debts = debts_of_user(&state.db, auth.id).await?;
    let data: Vec<DebtResponse> = debts
        .into_iter()
        .map(|(debt, payments)| DebtResponse::reconciled(debt, &payments))
        .filter(|response| response.status == wanted)
        .collect();

    let response = ApiResponse {
        data,
        message: "Debts retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a debt
///
/// Setting status to PAID settles the debt through the reconciliation engine
/// (emitting the receivable-collected income transaction once); downgrading
/// a settled debt to PENDING is rejected.
#[utoipa::path(
    put,
    path = "/api/v1/debts/{debt_id}",
    tag = "debts",
    params(
        ("debt_id" = i32, Path, description = "Debt ID"),
    ),
    request_body = UpdateDebtRequest,
    responses(
        (status = 200, description = "Debt updated successfully", body = ApiResponse<DebtResponse>),
        (status = 404, description = "Debt not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Debt already settled", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_debt(
    Path(debt_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateDebtRequest>,
) -> ApiResult<Json<ApiResponse<DebtResponse>>> {
    let (debt, debtor) = find_owned_debt(&state.db, auth.id, debt_id).await?;
    check_links(&state.db, auth.id, request.category_id, request.account_id).await?;
    let requested_status = request.status.as_deref().map(parse_debt_status).transpose()?;

    let txn = state.db.begin().await?;

    let mut active: debt::ActiveModel = debt.clone().into();
    if let Some(description) = request.description {
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(ApiError::Validation("Description is required".to_string()));
        }
        active.description = Set(description);
    }
    if let Some(total_amount) = request.total_amount {
        if total_amount < Decimal::ZERO {
            return Err(ApiError::Validation(
                "Total amount must not be negative".to_string(),
            ));
        }
        active.total_amount = Set(total_amount);
    }
    if let Some(due_date) = request.due_date {
        active.due_date = Set(Some(due_date));
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(account_id) = request.account_id {
        active.account_id = Set(Some(account_id));
    }
    let mut updated = active.update(&txn).await?;

    match requested_status {
        Some(DebtStatus::Paid) => {
            let (settled, collected) =
                compute::debt::settle(&txn, &updated, &debtor, Utc::now().date_naive()).await?;
            info!(
                debt_id = settled.id,
                transaction_id = collected.id,
                "debt settled via update"
            );
            updated = settled;
        }
        Some(DebtStatus::Pending) if updated.status == DebtStatus::Paid => {
            return Err(ApiError::Compute(compute::ComputeError::AlreadySettled));
        }
        _ => {}
    }

    txn.commit().await?;

    let payments = updated.find_related(Payment).all(&state.db).await?;
    let response = ApiResponse {
        data: DebtResponse::reconciled(updated, &payments),
        message: "Debt updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a debt
#[utoipa::path(
    delete,
    path = "/api/v1/debts/{debt_id}",
    tag = "debts",
    params(
        ("debt_id" = i32, Path, description = "Debt ID"),
    ),
    responses(
        (status = 200, description = "Debt deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Debt not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_debt(
    Path(debt_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let (debt, _debtor) = find_owned_debt(&state.db, auth.id, debt_id).await?;
    debt.delete(&state.db).await?;

    info!(debt_id, owner_id = auth.id, "debt deleted");
    let response = ApiResponse {
        data: format!("Debt {debt_id} deleted"),
        message: "Debt deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
