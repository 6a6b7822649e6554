use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use common::{FinancialSummary, SummaryPeriod, VirtualOccurrence};
use model::entities::{
    prelude::{Subscription, Transaction, TransactionInstallment},
    subscription,
    transaction::{self, InstallmentPeriod, TransactionKind},
    transaction_installment,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::accounts::find_owned_account;
use crate::handlers::categories::find_owned_category;
use crate::handlers::debts::find_owned_debt;
use crate::handlers::subscriptions::parse_billing_period;
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a transaction
///
/// Besides the plain money movement, one request can open a recurring
/// subscription (`is_recurring` + `subscription_period`), register a payment
/// against a debt (`debt_id`, income only), or create an installment plan.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// "Income" or "Expense"
    pub kind: String,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
    /// Create a subscription from this transaction
    pub is_recurring: Option<bool>,
    /// Billing period for the created subscription: Daily, Weekly, Monthly
    /// or Yearly
    pub subscription_period: Option<String>,
    /// Record this income as a payment against one of the user's debts
    pub debt_id: Option<i32>,
    /// Split this transaction into scheduled installments
    pub is_installment_plan: Option<bool>,
    /// Number of installments, 2 to 48
    pub installment_count: Option<i32>,
    /// "Monthly" or "Weekly"
    pub installment_period: Option<String>,
    /// First due date (default: the transaction date)
    pub first_installment_date: Option<NaiveDate>,
}

/// Request body for updating a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateTransactionRequest {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    /// "Income" or "Expense"
    pub kind: Option<String>,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

/// Installment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstallmentResponse {
    pub id: i32,
    pub transaction_id: i32,
    pub installment_number: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    /// "Pending" or "Paid"
    pub status: String,
    pub paid_date: Option<chrono::NaiveDateTime>,
}

impl From<transaction_installment::Model> for InstallmentResponse {
    fn from(model: transaction_installment::Model) -> Self {
        Self {
            id: model.id,
            transaction_id: model.transaction_id,
            installment_number: model.installment_number,
            amount: model.amount,
            due_date: model.due_date,
            status: format!("{:?}", model.status),
            paid_date: model.paid_date,
        }
    }
}

/// Transaction response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// "Income", "Expense" or "Paid"
    pub kind: String,
    pub is_recurring: bool,
    pub subscription_id: Option<i32>,
    pub is_installment_plan: bool,
    pub installment_count: Option<i32>,
    pub installment_period: Option<String>,
    pub installment_amount: Option<Decimal>,
    pub first_installment_date: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
    /// Installment slices for plan transactions, ascending number
    pub installments: Vec<InstallmentResponse>,
}

impl TransactionResponse {
    fn with_installments(
        model: transaction::Model,
        installments: Vec<transaction_installment::Model>,
    ) -> Self {
        Self {
            id: model.id,
            description: model.description,
            amount: model.amount,
            date: model.date,
            kind: format!("{:?}", model.kind),
            is_recurring: model.is_recurring,
            subscription_id: model.subscription_id,
            is_installment_plan: model.is_installment_plan,
            installment_count: model.installment_count,
            installment_period: model.installment_period.map(|p| format!("{p:?}")),
            installment_amount: model.installment_amount,
            first_installment_date: model.first_installment_date,
            category_id: model.category_id,
            account_id: model.account_id,
            installments: installments
                .into_iter()
                .map(InstallmentResponse::from)
                .collect(),
        }
    }
}

impl From<transaction::Model> for TransactionResponse {
    fn from(model: transaction::Model) -> Self {
        Self::with_installments(model, Vec::new())
    }
}

/// Listing response: real transactions plus, for month-bounded listings, the
/// virtual occurrences of the user's subscriptions in that window
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub virtual_occurrences: Vec<VirtualOccurrence>,
}

/// Request body for a partial payment against an installment plan
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PartialPaymentRequest {
    pub amount: Decimal,
}

/// Outcome of a partial payment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PartialPaymentResponse {
    /// Installments this payment covered in full
    pub paid_installments: Vec<InstallmentResponse>,
    pub applied_amount: Decimal,
    /// Leftover returned to the caller; installments are never split
    pub remaining_amount: Decimal,
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct TransactionQuery {
    /// Month (1-12); requires `year`
    pub month: Option<u32>,
    /// Year; requires `month`
    pub year: Option<i32>,
    /// Filter by account
    pub account_id: Option<i32>,
}

/// Query parameters for the financial summary
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct SummaryQuery {
    /// Month (1-12); omit both for all-time totals
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// Helper function to parse kind strings for user-created transactions.
// "Paid" is a terminal state reached through the pay endpoints, never set
// directly.
fn parse_transaction_kind(kind: &str) -> ApiResult<TransactionKind> {
    match kind {
        "Income" => Ok(TransactionKind::Income),
        "Expense" => Ok(TransactionKind::Expense),
        other => Err(ApiError::Validation(format!(
            "Transaction kind must be Income or Expense, got {other}"
        ))),
    }
}

fn parse_installment_period(period: &str) -> ApiResult<InstallmentPeriod> {
    match period {
        "Monthly" => Ok(InstallmentPeriod::Monthly),
        "Weekly" => Ok(InstallmentPeriod::Weekly),
        other => Err(ApiError::Compute(compute::ComputeError::InvalidFrequency(
            other.to_string(),
        ))),
    }
}

fn month_period(month: Option<u32>, year: Option<i32>) -> ApiResult<Option<SummaryPeriod>> {
    match (month, year) {
        (Some(month), Some(year)) => SummaryPeriod::month(year, month)
            .map(Some)
            .ok_or_else(|| ApiError::Validation(format!("Invalid month: {month}"))),
        (None, None) => Ok(None),
        _ => Err(ApiError::Validation(
            "month and year must be provided together".to_string(),
        )),
    }
}

pub(crate) async fn find_owned_transaction(
    db: &DatabaseConnection,
    owner_id: i32,
    transaction_id: i32,
) -> ApiResult<transaction::Model> {
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction"))
}

async fn installments_of(
    db: &DatabaseConnection,
    tx: &transaction::Model,
) -> ApiResult<Vec<transaction_installment::Model>> {
    if !tx.is_installment_plan {
        return Ok(Vec::new());
    }
    Ok(TransactionInstallment::find()
        .filter(transaction_installment::Column::TransactionId.eq(tx.id))
        .order_by_asc(transaction_installment::Column::InstallmentNumber)
        .all(db)
        .await?)
}

/// Create a new transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Linked entity not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TransactionResponse>>)> {
    let description = request.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiError::Validation("Description is required".to_string()));
    }
    if request.amount <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    let kind = parse_transaction_kind(&request.kind)?;

    // Ownership and validity checks all happen before any write.
    if let Some(category_id) = request.category_id {
        find_owned_category(&state.db, auth.id, category_id).await?;
    }
    if let Some(account_id) = request.account_id {
        find_owned_account(&state.db, auth.id, account_id).await?;
    }

    let is_recurring = request.is_recurring.unwrap_or(false);
    let subscription_period = match (is_recurring, request.subscription_period.as_deref()) {
        (true, Some(period)) => {
            let dup = Subscription::find()
                .filter(subscription::Column::OwnerId.eq(auth.id))
                .filter(subscription::Column::Name.eq(description.as_str()))
                .one(&state.db)
                .await?;
            if dup.is_some() {
                return Err(ApiError::Conflict(
                    "A subscription with this name already exists".to_string(),
                ));
            }
            Some(parse_billing_period(period)?)
        }
        (true, None) => {
            return Err(ApiError::Validation(
                "subscription_period is required for recurring transactions".to_string(),
            ))
        }
        (false, _) => None,
    };

    let linked_debt = match request.debt_id {
        Some(debt_id) => {
            if kind != TransactionKind::Income {
                return Err(ApiError::Validation(
                    "Only income transactions can settle debts".to_string(),
                ));
            }
            Some(find_owned_debt(&state.db, auth.id, debt_id).await?)
        }
        None => None,
    };

    let is_plan = request.is_installment_plan.unwrap_or(false);
    let plan = if is_plan {
        let count = request.installment_count.ok_or_else(|| {
            ApiError::Validation("installment_count is required for installment plans".to_string())
        })?;
        let period = parse_installment_period(request.installment_period.as_deref().ok_or_else(
            || ApiError::Validation("installment_period is required for installment plans".to_string()),
        )?)?;
        let slice = compute::installment::split_amount(request.amount, count)?;
        let first_date = request.first_installment_date.unwrap_or(request.date);
        Some((count, period, slice, first_date))
    } else {
        None
    };

    let txn = state.db.begin().await?;

    let subscription_id = match subscription_period {
        Some(period) => {
            let created = subscription::ActiveModel {
                name: Set(description.clone()),
                description: Set(Some(format!(
                    "Auto-generated from transaction: {description}"
                ))),
                amount: Set(request.amount),
                kind: Set(kind),
                period: Set(period),
                start_date: Set(request.date),
                end_date: Set(None),
                is_active: Set(true),
                next_payment_date: Set(request.date),
                last_processed_at: Set(None),
                owner_id: Set(auth.id),
                category_id: Set(request.category_id),
                account_id: Set(request.account_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            info!(subscription_id = created.id, "subscription auto-created");
            Some(created.id)
        }
        None => None,
    };

    if let Some((debt, debtor)) = &linked_debt {
        let outcome = compute::debt::record_payment(
            &txn,
            debt,
            debtor,
            request.amount,
            request.date.and_time(NaiveTime::MIN),
            Some(format!("Paid via transaction: {description}")),
            Utc::now().date_naive(),
        )
        .await?;
        info!(
            debt_id = debt.id,
            settled = outcome.collected.is_some(),
            "debt payment recorded from transaction"
        );
    }

    let mut active = transaction::ActiveModel {
        description: Set(description),
        amount: Set(request.amount),
        date: Set(request.date),
        kind: Set(kind),
        is_recurring: Set(is_recurring),
        subscription_id: Set(subscription_id),
        is_installment_plan: Set(is_plan),
        installment_count: Set(None),
        installment_period: Set(None),
        installment_amount: Set(None),
        first_installment_date: Set(None),
        owner_id: Set(auth.id),
        category_id: Set(request.category_id),
        account_id: Set(request.account_id),
        ..Default::default()
    };
    if let Some((count, period, slice, first_date)) = plan {
        active.installment_count = Set(Some(count));
        active.installment_period = Set(Some(period));
        active.installment_amount = Set(Some(slice));
        active.first_installment_date = Set(Some(first_date));
    }
    let created = active.insert(&txn).await?;

    let installments = if is_plan {
        compute::installment::materialize_plan(&txn, &created).await?
    } else {
        Vec::new()
    };

    txn.commit().await?;
    info!(transaction_id = created.id, owner_id = auth.id, "transaction created");

    let response = ApiResponse {
        data: TransactionResponse::with_installments(created, installments),
        message: "Transaction created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get transactions of the authenticated user
///
/// With `month` and `year` the listing is bounded to that calendar month and
/// also carries the virtual occurrences of the user's active subscriptions
/// inside the window — computed on demand, never persisted.
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<TransactionListResponse>),
        (status = 400, description = "Invalid query", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    Query(query): Query<TransactionQuery>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<TransactionListResponse>>> {
    let period = month_period(query.month, query.year)?;

    let mut finder = Transaction::find().filter(transaction::Column::OwnerId.eq(auth.id));
    if let Some(account_id) = query.account_id {
        finder = finder.filter(transaction::Column::AccountId.eq(account_id));
    }
    if let Some(period) = period {
        if let Some((start, end)) = period.bounds() {
            finder = finder.filter(transaction::Column::Date.between(start, end));
        }
    }
    let transactions = finder
        .order_by_desc(transaction::Column::Date)
        .all(&state.db)
        .await?;

    // Attach installment slices to plan transactions in one query.
    let plan_ids: Vec<i32> = transactions
        .iter()
        .filter(|t| t.is_installment_plan)
        .map(|t| t.id)
        .collect();
    let mut by_plan: HashMap<i32, Vec<transaction_installment::Model>> = HashMap::new();
    if !plan_ids.is_empty() {
        let slices = TransactionInstallment::find()
            .filter(transaction_installment::Column::TransactionId.is_in(plan_ids))
            .order_by_asc(transaction_installment::Column::InstallmentNumber)
            .all(&state.db)
            .await?;
        for slice in slices {
            by_plan.entry(slice.transaction_id).or_default().push(slice);
        }
    }

    let virtual_occurrences = match period.and_then(|p| p.bounds()) {
        Some((start, end)) => {
            let subscriptions = Subscription::find()
                .filter(subscription::Column::OwnerId.eq(auth.id))
                .filter(subscription::Column::IsActive.eq(true))
                .all(&state.db)
                .await?;
            compute::recurring::project_virtual(&subscriptions, start, end)
        }
        None => Vec::new(),
    };

    let data = TransactionListResponse {
        transactions: transactions
            .into_iter()
            .map(|tx| {
                let slices = by_plan.remove(&tx.id).unwrap_or_default();
                TransactionResponse::with_installments(tx, slices)
            })
            .collect(),
        virtual_occurrences,
    };
    let response = ApiResponse {
        data,
        message: "Transactions retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific transaction by ID
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<TransactionResponse>>> {
    let tx = find_owned_transaction(&state.db, auth.id, transaction_id).await?;
    let installments = installments_of(&state.db, &tx).await?;

    let response = ApiResponse {
        data: TransactionResponse::with_installments(tx, installments),
        message: "Transaction retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a transaction
#[utoipa::path(
    put,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated successfully", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<ApiResponse<TransactionResponse>>> {
    let existing = find_owned_transaction(&state.db, auth.id, transaction_id).await?;

    if let Some(category_id) = request.category_id {
        find_owned_category(&state.db, auth.id, category_id).await?;
    }
    if let Some(account_id) = request.account_id {
        find_owned_account(&state.db, auth.id, account_id).await?;
    }

    let mut active: transaction::ActiveModel = existing.into();
    if let Some(description) = request.description {
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(ApiError::Validation("Description is required".to_string()));
        }
        active.description = Set(description);
    }
    if let Some(amount) = request.amount {
        if amount <= Decimal::ZERO {
            return Err(ApiError::Validation(
                "Amount must be greater than zero".to_string(),
            ));
        }
        active.amount = Set(amount);
    }
    if let Some(date) = request.date {
        active.date = Set(date);
    }
    if let Some(kind) = request.kind {
        active.kind = Set(parse_transaction_kind(&kind)?);
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(account_id) = request.account_id {
        active.account_id = Set(Some(account_id));
    }

    let updated = active.update(&state.db).await?;
    info!(transaction_id = updated.id, "transaction updated");
    let installments = installments_of(&state.db, &updated).await?;

    let response = ApiResponse {
        data: TransactionResponse::with_installments(updated, installments),
        message: "Transaction updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a transaction
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Transaction not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let tx = find_owned_transaction(&state.db, auth.id, transaction_id).await?;
    tx.delete(&state.db).await?;

    info!(transaction_id, owner_id = auth.id, "transaction deleted");
    let response = ApiResponse {
        data: format!("Transaction {transaction_id} deleted"),
        message: "Transaction deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get the financial summary
///
/// All-time with no parameters, or one calendar month with `month` + `year`.
#[utoipa::path(
    get,
    path = "/api/v1/transactions/summary",
    tag = "transactions",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Summary computed successfully", body = ApiResponse<FinancialSummary>),
        (status = 400, description = "Invalid query", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_summary(
    Query(query): Query<SummaryQuery>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<FinancialSummary>>> {
    let period = month_period(query.month, query.year)?.unwrap_or(SummaryPeriod::AllTime);
    let summary = compute::summary::summarize(&state.db, auth.id, period).await?;

    let response = ApiResponse {
        data: summary,
        message: "Summary computed successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Mark a whole transaction as paid
///
/// Pays every pending installment of a plan in one batch; an expense parent
/// transitions to the terminal Paid kind and stops counting as an expense.
#[utoipa::path(
    put,
    path = "/api/v1/transactions/{transaction_id}/pay",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction marked paid", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn pay_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<TransactionResponse>>> {
    let tx = find_owned_transaction(&state.db, auth.id, transaction_id).await?;

    let txn = state.db.begin().await?;
    let updated =
        compute::installment::mark_transaction_paid(&txn, &tx, Utc::now().naive_utc()).await?;
    txn.commit().await?;

    let installments = installments_of(&state.db, &updated).await?;
    let response = ApiResponse {
        data: TransactionResponse::with_installments(updated, installments),
        message: "Transaction marked as paid".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Mark a single installment as paid
#[utoipa::path(
    put,
    path = "/api/v1/transactions/{transaction_id}/installments/{installment_id}/pay",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
        ("installment_id" = i32, Path, description = "Installment ID"),
    ),
    responses(
        (status = 200, description = "Installment marked paid", body = ApiResponse<InstallmentResponse>),
        (status = 404, description = "Installment not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Installment already paid", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn pay_transaction_installment(
    Path((transaction_id, installment_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<InstallmentResponse>>> {
    let tx = find_owned_transaction(&state.db, auth.id, transaction_id).await?;

    let installment = TransactionInstallment::find_by_id(installment_id)
        .filter(transaction_installment::Column::TransactionId.eq(tx.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Installment"))?;

    let paid =
        compute::installment::pay_installment(&state.db, &installment, Utc::now().naive_utc())
            .await?;

    let response = ApiResponse {
        data: InstallmentResponse::from(paid),
        message: "Installment marked as paid".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Apply a partial payment to an installment plan
///
/// Pays the earliest pending installments in full while the amount covers
/// them; the leftover is returned, never applied to a fraction of a slice.
#[utoipa::path(
    post,
    path = "/api/v1/transactions/{transaction_id}/partial-payment",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    request_body = PartialPaymentRequest,
    responses(
        (status = 200, description = "Partial payment applied", body = ApiResponse<PartialPaymentResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_partial_payment(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<PartialPaymentRequest>,
) -> ApiResult<Json<ApiResponse<PartialPaymentResponse>>> {
    let tx = find_owned_transaction(&state.db, auth.id, transaction_id).await?;

    let txn = state.db.begin().await?;
    let outcome =
        compute::installment::apply_partial_payment(&txn, &tx, request.amount, Utc::now().naive_utc())
            .await?;
    txn.commit().await?;

    if outcome.remaining_amount > Decimal::ZERO {
        warn!(
            transaction_id,
            remaining = %outcome.remaining_amount,
            "partial payment left an unapplied remainder"
        );
    }

    let response = ApiResponse {
        data: PartialPaymentResponse {
            paid_installments: outcome
                .paid
                .into_iter()
                .map(InstallmentResponse::from)
                .collect(),
            applied_amount: outcome.applied_amount,
            remaining_amount: outcome.remaining_amount,
        },
        message: "Partial payment applied".to_string(),
        success: true,
    };
    Ok(Json(response))
}
