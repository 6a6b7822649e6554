use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use model::entities::{
    debt, debtor,
    prelude::{Debt, Debtor},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::debts::DebtResponse;
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a new debtor
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateDebtorRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Request body for updating a debtor
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateDebtorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Debtor response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DebtorResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub owner_id: i32,
}

impl From<debtor::Model> for DebtorResponse {
    fn from(model: debtor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            owner_id: model.owner_id,
        }
    }
}

pub(crate) async fn find_owned_debtor(
    db: &DatabaseConnection,
    owner_id: i32,
    debtor_id: i32,
) -> ApiResult<debtor::Model> {
    Debtor::find_by_id(debtor_id)
        .filter(debtor::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Debtor"))
}

/// Create a new debtor
#[utoipa::path(
    post,
    path = "/api/v1/debtors",
    tag = "debtors",
    request_body = CreateDebtorRequest,
    responses(
        (status = 201, description = "Debtor created successfully", body = ApiResponse<DebtorResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_debtor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateDebtorRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DebtorResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Debtor name is required".to_string()));
    }

    let created = debtor::ActiveModel {
        name: Set(name.to_string()),
        email: Set(request.email),
        phone: Set(request.phone),
        owner_id: Set(auth.id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(debtor_id = created.id, owner_id = auth.id, "debtor created");
    let response = ApiResponse {
        data: DebtorResponse::from(created),
        message: "Debtor created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all debtors of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/debtors",
    tag = "debtors",
    responses(
        (status = 200, description = "Debtors retrieved successfully", body = ApiResponse<Vec<DebtorResponse>>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debtors(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<DebtorResponse>>>> {
    let debtors = Debtor::find()
        .filter(debtor::Column::OwnerId.eq(auth.id))
        .order_by_asc(debtor::Column::Name)
        .all(&state.db)
        .await?;

    let response = ApiResponse {
        data: debtors.into_iter().map(DebtorResponse::from).collect(),
        message: "Debtors retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific debtor by ID
#[utoipa::path(
    get,
    path = "/api/v1/debtors/{debtor_id}",
    tag = "debtors",
    params(
        ("debtor_id" = i32, Path, description = "Debtor ID"),
    ),
    responses(
        (status = 200, description = "Debtor retrieved successfully", body = ApiResponse<DebtorResponse>),
        (status = 404, description = "Debtor not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debtor(
    Path(debtor_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<DebtorResponse>>> {
    let debtor = find_owned_debtor(&state.db, auth.id, debtor_id).await?;

    let response = ApiResponse {
        data: DebtorResponse::from(debtor),
        message: "Debtor retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get all debts of one debtor, with reconciled figures
#[utoipa::path(
    get,
    path = "/api/v1/debtors/{debtor_id}/debts",
    tag = "debtors",
    params(
        ("debtor_id" = i32, Path, description = "Debtor ID"),
    ),
    responses(
        (status = 200, description = "Debts retrieved successfully", body = ApiResponse<Vec<DebtResponse>>),
        (status = 404, description = "Debtor not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debtor_debts(
    Path(debtor_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<DebtResponse>>>> {
    let debtor = find_owned_debtor(&state.db, auth.id, debtor_id).await?;

    let debts = Debt::find()
        .filter(debt::Column::DebtorId.eq(debtor.id))
        .find_with_related(model::entities::prelude::Payment)
        .all(&state.db)
        .await?;

    let data = debts
        .into_iter()
        .map(|(debt, payments)| DebtResponse::reconciled(debt, &payments))
        .collect();
    let response = ApiResponse {
        data,
        message: "Debts retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a debtor
#[utoipa::path(
    put,
    path = "/api/v1/debtors/{debtor_id}",
    tag = "debtors",
    params(
        ("debtor_id" = i32, Path, description = "Debtor ID"),
    ),
    request_body = UpdateDebtorRequest,
    responses(
        (status = 200, description = "Debtor updated successfully", body = ApiResponse<DebtorResponse>),
        (status = 404, description = "Debtor not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_debtor(
    Path(debtor_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateDebtorRequest>,
) -> ApiResult<Json<ApiResponse<DebtorResponse>>> {
    let existing = find_owned_debtor(&state.db, auth.id, debtor_id).await?;

    let mut active: debtor::ActiveModel = existing.into();
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation("Debtor name is required".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(email) = request.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = request.phone {
        active.phone = Set(Some(phone));
    }

    let updated = active.update(&state.db).await?;
    info!(debtor_id = updated.id, "debtor updated");

    let response = ApiResponse {
        data: DebtorResponse::from(updated),
        message: "Debtor updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a debtor
///
/// Cascades through the debtor's debts and their payments.
#[utoipa::path(
    delete,
    path = "/api/v1/debtors/{debtor_id}",
    tag = "debtors",
    params(
        ("debtor_id" = i32, Path, description = "Debtor ID"),
    ),
    responses(
        (status = 200, description = "Debtor deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Debtor not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_debtor(
    Path(debtor_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let debtor = find_owned_debtor(&state.db, auth.id, debtor_id).await?;
    debtor.delete(&state.db).await?;

    info!(debtor_id, owner_id = auth.id, "debtor deleted");
    let response = ApiResponse {
        data: format!("Debtor {debtor_id} deleted"),
        message: "Debtor deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
