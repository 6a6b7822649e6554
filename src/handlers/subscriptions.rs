use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{Days, NaiveDate, Utc};
use common::ProcessingReport;
use model::entities::{
    prelude::Subscription,
    subscription::{self, BillingPeriod},
    transaction::TransactionKind,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::accounts::find_owned_account;
use crate::handlers::categories::find_owned_category;
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a subscription
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    /// Subscription name, unique per user
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    /// "Income" or "Expense"
    pub kind: String,
    /// Daily, Weekly, Monthly or Yearly
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

/// Request body for updating a subscription
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<String>,
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

/// Subscription response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub kind: String,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub next_payment_date: NaiveDate,
    pub last_processed_at: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
    /// Active and past its next payment date
    pub is_overdue: bool,
}

impl SubscriptionResponse {
    fn new(model: subscription::Model, today: NaiveDate) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            amount: model.amount,
            kind: format!("{:?}", model.kind),
            period: format!("{:?}", model.period),
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            next_payment_date: model.next_payment_date,
            last_processed_at: model.last_processed_at,
            category_id: model.category_id,
            account_id: model.account_id,
            is_overdue: model.is_active && model.next_payment_date < today,
        }
    }
}

/// Query parameters for upcoming subscriptions
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct UpcomingQuery {
    /// Look-ahead window in days (default: 7)
    pub days: Option<u64>,
}

// Helper function to parse period strings to BillingPeriod
pub(crate) fn parse_billing_period(period: &str) -> ApiResult<BillingPeriod> {
    match period {
        "Daily" => Ok(BillingPeriod::Daily),
        "Weekly" => Ok(BillingPeriod::Weekly),
        "Monthly" => Ok(BillingPeriod::Monthly),
        "Yearly" => Ok(BillingPeriod::Yearly),
        other => Err(ApiError::Compute(compute::ComputeError::InvalidFrequency(
            other.to_string(),
        ))),
    }
}

fn parse_subscription_kind(kind: &str) -> ApiResult<TransactionKind> {
    match kind {
        "Income" => Ok(TransactionKind::Income),
        "Expense" => Ok(TransactionKind::Expense),
        other => Err(ApiError::Validation(format!(
            "Subscription kind must be Income or Expense, got {other}"
        ))),
    }
}

async fn find_owned_subscription(
    db: &DatabaseConnection,
    owner_id: i32,
    subscription_id: i32,
) -> ApiResult<subscription::Model> {
    Subscription::find_by_id(subscription_id)
        .filter(subscription::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Subscription"))
}

async fn ensure_name_available(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
    exclude_id: Option<i32>,
) -> ApiResult<()> {
    let existing = Subscription::find()
        .filter(subscription::Column::OwnerId.eq(owner_id))
        .filter(subscription::Column::Name.eq(name))
        .one(db)
        .await?;
    if existing.map(|s| Some(s.id) != exclude_id).unwrap_or(false) {
        warn!(owner_id, name, "duplicate subscription name");
        return Err(ApiError::Conflict(
            "A subscription with this name already exists".to_string(),
        ));
    }
    Ok(())
}

/// Create a new subscription
///
/// The first charge falls one period after the start date.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created successfully", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Duplicate subscription name", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubscriptionResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation(
            "Subscription name is required".to_string(),
        ));
    }
    if request.amount <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    let kind = parse_subscription_kind(&request.kind)?;
    let period = parse_billing_period(&request.period)?;

    if let Some(category_id) = request.category_id {
        find_owned_category(&state.db, auth.id, category_id).await?;
    }
    if let Some(account_id) = request.account_id {
        find_owned_account(&state.db, auth.id, account_id).await?;
    }
    ensure_name_available(&state.db, auth.id, name, None).await?;

    let next_payment_date = compute::recurring::next_occurrence(request.start_date, period)?;

    let created = subscription::ActiveModel {
        name: Set(name.to_string()),
        description: Set(request.description),
        amount: Set(request.amount),
        kind: Set(kind),
        period: Set(period),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        is_active: Set(true),
        next_payment_date: Set(next_payment_date),
        last_processed_at: Set(None),
        owner_id: Set(auth.id),
        category_id: Set(request.category_id),
        account_id: Set(request.account_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(subscription_id = created.id, owner_id = auth.id, "subscription created");
    let response = ApiResponse {
        data: SubscriptionResponse::new(created, Utc::now().date_naive()),
        message: "Subscription created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all subscriptions of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscriptions retrieved successfully", body = ApiResponse<Vec<SubscriptionResponse>>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<SubscriptionResponse>>>> {
    let subscriptions = Subscription::find()
        .filter(subscription::Column::OwnerId.eq(auth.id))
        .order_by_desc(subscription::Column::Id)
        .all(&state.db)
        .await?;

    let today = Utc::now().date_naive();
    let response = ApiResponse {
        data: subscriptions
            .into_iter()
            .map(|s| SubscriptionResponse::new(s, today))
            .collect(),
        message: "Subscriptions retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific subscription by ID
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{subscription_id}",
    tag = "subscriptions",
    params(
        ("subscription_id" = i32, Path, description = "Subscription ID"),
    ),
    responses(
        (status = 200, description = "Subscription retrieved successfully", body = ApiResponse<SubscriptionResponse>),
        (status = 404, description = "Subscription not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_subscription(
    Path(subscription_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<SubscriptionResponse>>> {
    let subscription = find_owned_subscription(&state.db, auth.id, subscription_id).await?;

    let response = ApiResponse {
        data: SubscriptionResponse::new(subscription, Utc::now().date_naive()),
        message: "Subscription retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a subscription
///
/// Changing the period or start date recomputes the next payment date from
/// the last processed occurrence (or the new start date if nothing was
/// processed yet).
#[utoipa::path(
    put,
    path = "/api/v1/subscriptions/{subscription_id}",
    tag = "subscriptions",
    params(
        ("subscription_id" = i32, Path, description = "Subscription ID"),
    ),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated successfully", body = ApiResponse<SubscriptionResponse>),
        (status = 404, description = "Subscription not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Duplicate subscription name", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_subscription(
    Path(subscription_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> ApiResult<Json<ApiResponse<SubscriptionResponse>>> {
    let existing = find_owned_subscription(&state.db, auth.id, subscription_id).await?;

    if let Some(amount) = request.amount {
        if amount <= Decimal::ZERO {
            return Err(ApiError::Validation(
                "Amount must be greater than zero".to_string(),
            ));
        }
    }
    if let Some(category_id) = request.category_id {
        find_owned_category(&state.db, auth.id, category_id).await?;
    }
    if let Some(account_id) = request.account_id {
        find_owned_account(&state.db, auth.id, account_id).await?;
    }

    let new_period = request
        .period
        .as_deref()
        .map(parse_billing_period)
        .transpose()?;
    let new_kind = request
        .kind
        .as_deref()
        .map(parse_subscription_kind)
        .transpose()?;

    // Recompute the pointer when the schedule itself changed.
    let schedule_changed = new_period.is_some() || request.start_date.is_some();
    let effective_period = new_period.unwrap_or(existing.period);
    let effective_start = request.start_date.unwrap_or(existing.start_date);

    let mut active: subscription::ActiveModel = existing.clone().into();
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation(
                "Subscription name is required".to_string(),
            ));
        }
        ensure_name_available(&state.db, auth.id, &name, Some(subscription_id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(kind) = new_kind {
        active.kind = Set(kind);
    }
    if let Some(period) = new_period {
        active.period = Set(period);
    }
    if let Some(start_date) = request.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = request.end_date {
        active.end_date = Set(Some(end_date));
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(account_id) = request.account_id {
        active.account_id = Set(Some(account_id));
    }
    if schedule_changed {
        let base = existing.last_processed_at.unwrap_or(effective_start);
        active.next_payment_date =
            Set(compute::recurring::next_occurrence(base, effective_period)?);
    }

    let updated = active.update(&state.db).await?;
    info!(subscription_id = updated.id, "subscription updated");

    let response = ApiResponse {
        data: SubscriptionResponse::new(updated, Utc::now().date_naive()),
        message: "Subscription updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a subscription
///
/// Transactions it generated keep existing with the subscription reference
/// nulled out.
#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{subscription_id}",
    tag = "subscriptions",
    params(
        ("subscription_id" = i32, Path, description = "Subscription ID"),
    ),
    responses(
        (status = 200, description = "Subscription deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Subscription not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_subscription(
    Path(subscription_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let subscription = find_owned_subscription(&state.db, auth.id, subscription_id).await?;
    subscription.delete(&state.db).await?;

    info!(subscription_id, owner_id = auth.id, "subscription deleted");
    let response = ApiResponse {
        data: format!("Subscription {subscription_id} deleted"),
        message: "Subscription deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Pause or resume a subscription
#[utoipa::path(
    patch,
    path = "/api/v1/subscriptions/{subscription_id}/toggle",
    tag = "subscriptions",
    params(
        ("subscription_id" = i32, Path, description = "Subscription ID"),
    ),
    responses(
        (status = 200, description = "Subscription toggled", body = ApiResponse<SubscriptionResponse>),
        (status = 404, description = "Subscription not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_subscription(
    Path(subscription_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<SubscriptionResponse>>> {
    let existing = find_owned_subscription(&state.db, auth.id, subscription_id).await?;
    let was_active = existing.is_active;

    let mut active: subscription::ActiveModel = existing.into();
    active.is_active = Set(!was_active);
    let updated = active.update(&state.db).await?;

    info!(
        subscription_id = updated.id,
        is_active = updated.is_active,
        "subscription toggled"
    );
    let response = ApiResponse {
        data: SubscriptionResponse::new(updated, Utc::now().date_naive()),
        message: "Subscription toggled successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Process the authenticated user's due subscriptions now
///
/// Same engine the background timer runs for everyone, scoped to one user.
/// Best effort: a failing subscription lands in the error list and does not
/// block the rest.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/process",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Processing finished", body = ApiResponse<ProcessingReport>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn process_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<ProcessingReport>>> {
    let report =
        compute::recurring::process_due(&state.db, Utc::now().date_naive(), Some(auth.id)).await?;

    info!(
        owner_id = auth.id,
        processed = report.processed_count,
        errors = report.errors.len(),
        "subscription processing finished"
    );
    let message = format!(
        "{} subscriptions processed successfully",
        report.processed_count
    );
    let response = ApiResponse {
        data: report,
        message,
        success: true,
    };
    Ok(Json(response))
}

/// Get subscriptions due within the next days
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/upcoming",
    tag = "subscriptions",
    params(UpcomingQuery),
    responses(
        (status = 200, description = "Upcoming subscriptions retrieved", body = ApiResponse<Vec<SubscriptionResponse>>),
        (status = 400, description = "Invalid query", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_upcoming_subscriptions(
    Query(query): Query<UpcomingQuery>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<SubscriptionResponse>>>> {
    let days = query.days.unwrap_or(7);
    let today = Utc::now().date_naive();
    let until = today
        .checked_add_days(Days::new(days))
        .ok_or_else(|| ApiError::Validation(format!("Look-ahead too large: {days} days")))?;

    let subscriptions = Subscription::find()
        .filter(subscription::Column::OwnerId.eq(auth.id))
        .filter(subscription::Column::IsActive.eq(true))
        .filter(subscription::Column::NextPaymentDate.between(today, until))
        .order_by_asc(subscription::Column::NextPaymentDate)
        .all(&state.db)
        .await?;

    let response = ApiResponse {
        data: subscriptions
            .into_iter()
            .map(|s| SubscriptionResponse::new(s, today))
            .collect(),
        message: "Upcoming subscriptions retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
