use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{NaiveDateTime, Utc};
use model::entities::{
    debtor, payment,
    prelude::{Debt, Debtor, Payment},
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::debts::{find_owned_debt, DebtResponse};
use crate::schemas::{ApiResponse, AppState};

/// Request body for recording a payment against a debt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    /// Defaults to now when omitted
    pub payment_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

/// Payment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub debt_id: i32,
    pub amount: Decimal,
    pub payment_date: NaiveDateTime,
    pub notes: Option<String>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            debt_id: model.debt_id,
            amount: model.amount,
            payment_date: model.payment_date,
            notes: model.notes,
        }
    }
}

/// Response for a recorded payment: the payment plus the debt it changed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentCreatedResponse {
    pub payment: PaymentResponse,
    pub debt: DebtResponse,
}

/// Record a payment against a debt
///
/// The payment insert, the reconciliation and — when the payment settles the
/// debt — the auto-generated income transaction run in one store
/// transaction, so the settlement can never be half-applied.
#[utoipa::path(
    post,
    path = "/api/v1/debts/{debt_id}/payments",
    tag = "payments",
    params(
        ("debt_id" = i32, Path, description = "Debt ID"),
    ),
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentCreatedResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Debt not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_payment(
    Path(debt_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaymentCreatedResponse>>)> {
    let (debt, debtor) = find_owned_debt(&state.db, auth.id, debt_id).await?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let outcome = compute::debt::record_payment(
        &txn,
        &debt,
        &debtor,
        request.amount,
        request.payment_date.unwrap_or_else(|| now.naive_utc()),
        request.notes,
        now.date_naive(),
    )
    .await?;
    txn.commit().await?;

    info!(
        payment_id = outcome.payment.id,
        debt_id,
        settled = outcome.collected.is_some(),
        "payment recorded"
    );

    let payments = outcome.debt.find_related(Payment).all(&state.db).await?;
    let response = ApiResponse {
        data: PaymentCreatedResponse {
            payment: PaymentResponse::from(outcome.payment),
            debt: DebtResponse::reconciled(outcome.debt, &payments),
        },
        message: "Payment recorded successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all payments of a debt, newest first
#[utoipa::path(
    get,
    path = "/api/v1/debts/{debt_id}/payments",
    tag = "payments",
    params(
        ("debt_id" = i32, Path, description = "Debt ID"),
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Debt not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debt_payments(
    Path(debt_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentResponse>>>> {
    let (debt, _debtor) = find_owned_debt(&state.db, auth.id, debt_id).await?;

    let payments = Payment::find()
        .filter(payment::Column::DebtId.eq(debt.id))
        .order_by_desc(payment::Column::PaymentDate)
        .all(&state.db)
        .await?;

    let response = ApiResponse {
        data: payments.into_iter().map(PaymentResponse::from).collect(),
        message: "Payments retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a payment
///
/// The reported figures change, but a settled debt stays settled — the PAID
/// latch is one-way.
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Payment deleted successfully", body = ApiResponse<DebtResponse>),
        (status = 404, description = "Payment not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<DebtResponse>>> {
    let payment = Payment::find_by_id(payment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment"))?;
    let debt = Debt::find_by_id(payment.debt_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment"))?;
    Debtor::find_by_id(debt.debtor_id)
        .filter(debtor::Column::OwnerId.eq(auth.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment"))?;

    payment.delete(&state.db).await?;
    info!(payment_id, debt_id = debt.id, "payment deleted");

    let payments = debt.find_related(Payment).all(&state.db).await?;
    let response = ApiResponse {
        data: DebtResponse::reconciled(debt, &payments),
        message: "Payment deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
