// src/handlers/categories.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireAdmin},
    models::catalog::{Category, CategoryOrder},
};

fn validate_category_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().chars().count() < 2 {
        return Err(validator::ValidationError::new("invalid_category_name"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(custom(function = "validate_category_name"))]
    #[schema(example = "Washing Machines")]
    pub name: String,
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categorias",
    responses(
        (status = 200, description = "Categorias da organização, na ordem de exibição", body = Vec<Category>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .catalog_service
        .list_categories(&caller)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(categories)))
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categorias",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada no fim da lista", body = Category),
        (status = 400, description = "Nome inválido"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: RequireAdmin,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .create_category(&admin.caller, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategoriesPayload {
    pub category_orders: Vec<CategoryOrder>,
}

// PUT /api/categories/reorder
#[utoipa::path(
    put,
    path = "/api/categories/reorder",
    tag = "Categorias",
    request_body = ReorderCategoriesPayload,
    responses(
        (status = 200, description = "Nova ordem aplicada", body = Vec<Category>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn reorder_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: RequireAdmin,
    Json(payload): Json<ReorderCategoriesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .catalog_service
        .reorder_categories(&admin.caller, &payload.category_orders)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(categories)))
}
