use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use model::entities::{category, prelude::Category};
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

const DEFAULT_COLOR: &str = "#808080";

/// Request body for creating a new category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    /// Category name, unique per user (case-insensitive)
    pub name: String,
    /// Display color as a hex string (default: grey)
    pub color: Option<String>,
}

/// Request body for updating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Category response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub owner_id: i32,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            color: model.color,
            owner_id: model.owner_id,
        }
    }
}

pub(crate) async fn find_owned_category(
    db: &DatabaseConnection,
    owner_id: i32,
    category_id: i32,
) -> ApiResult<category::Model> {
    Category::find_by_id(category_id)
        .filter(category::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))
}

async fn ensure_name_available(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
    exclude_id: Option<i32>,
) -> ApiResult<()> {
    let categories = Category::find()
        .filter(category::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?;
    let taken = categories
        .iter()
        .any(|c| Some(c.id) != exclude_id && c.name.eq_ignore_ascii_case(name));
    if taken {
        warn!(owner_id, name, "duplicate category name");
        return Err(ApiError::Conflict(
            "You already have a category with this name".to_string(),
        ));
    }
    Ok(())
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Duplicate category name", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation(
            "Category name is required".to_string(),
        ));
    }
    ensure_name_available(&state.db, auth.id, name, None).await?;

    let created = category::ActiveModel {
        name: Set(name.to_string()),
        color: Set(request.color.unwrap_or_else(|| DEFAULT_COLOR.to_string())),
        owner_id: Set(auth.id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(category_id = created.id, owner_id = auth.id, "category created");
    let response = ApiResponse {
        data: CategoryResponse::from(created),
        message: "Category created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all categories of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 401, description = "Unauthorized", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let categories = Category::find()
        .filter(category::Column::OwnerId.eq(auth.id))
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;

    let response = ApiResponse {
        data: categories.into_iter().map(CategoryResponse::from).collect(),
        message: "Categories retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category(
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<CategoryResponse>>> {
    let category = find_owned_category(&state.db, auth.id, category_id).await?;

    let response = ApiResponse {
        data: CategoryResponse::from(category),
        message: "Category retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Duplicate category name", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_category(
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<ApiResponse<CategoryResponse>>> {
    let existing = find_owned_category(&state.db, auth.id, category_id).await?;

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation(
                "Category name is required".to_string(),
            ));
        }
        ensure_name_available(&state.db, auth.id, &name, Some(category_id)).await?;
        active.name = Set(name);
    }
    if let Some(color) = request.color {
        active.color = Set(color);
    }

    let updated = active.update(&state.db).await?;
    info!(category_id = updated.id, "category updated");

    let response = ApiResponse {
        data: CategoryResponse::from(updated),
        message: "Category updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a category
///
/// Transactions that referenced the category keep existing with the category
/// reference nulled out.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let category = find_owned_category(&state.db, auth.id, category_id).await?;
    category.delete(&state.db).await?;

    info!(category_id, owner_id = auth.id, "category deleted");
    let response = ApiResponse {
        data: format!("Category {category_id} deleted"),
        message: "Category deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
