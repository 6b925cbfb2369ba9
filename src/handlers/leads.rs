// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError, ValidationError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireAdmin},
    models::lead::{LeadResponse, LeadStatus, ReviewStatus},
    services::{intake::CreateLeadPayload, lead_service::LeadQuery},
};

// =============================================================================
//  ÁREA 1: VENDEDOR
// =============================================================================

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = LeadResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Categoria não encontrada"),
        (status = 409, description = "Nota fiscal já cadastrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .create_lead(&caller, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListLeadsParams {
    /// `win` ou `lost`
    pub status: Option<String>,
    /// `pending`, `yet_to_review` ou `reviewed`
    pub review_status: Option<String>,
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(ListLeadsParams),
    responses(
        (status = 200, description = "Leads visíveis ao chamador, mais recentes primeiro", body = Vec<LeadResponse>),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(params): Query<ListLeadsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let status = params
        .status
        .as_deref()
        .map(|raw| LeadStatus::parse(raw).ok_or(ValidationError::InvalidStatus))
        .transpose()
        .map_err(|e| to_api(e.into()))?;
    let review_status = params
        .review_status
        .as_deref()
        .map(|raw| ReviewStatus::parse(raw).ok_or(ValidationError::InvalidReviewStatus))
        .transpose()
        .map_err(|e| to_api(e.into()))?;

    let leads = app_state
        .lead_service
        .list_leads(&caller, LeadQuery { status, review_status })
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/my-incentives
#[utoipa::path(
    get,
    path = "/api/leads/my-incentives",
    tag = "Leads",
    responses(
        (status = 200, description = "Vendas do chamador com incentivo concedido", body = Vec<LeadResponse>)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_incentives(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .lead_service
        .my_incentives(&caller)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(leads)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatusPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "INV001")]
    pub invoice_no: String,

    #[schema(example = "reviewed")]
    pub review_status: String,
}

// PUT /api/leads/review-status
#[utoipa::path(
    put,
    path = "/api/leads/review-status",
    tag = "Leads",
    request_body = ReviewStatusPayload,
    responses(
        (status = 200, description = "Status de revisão atualizado", body = LeadResponse),
        (status = 400, description = "Status inválido"),
        (status = 404, description = "Nenhuma venda com essa nota fiscal"),
        (status = 409, description = "Lead alterado por outra requisição")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_review_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<ReviewStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(e.into()))?;

    // `pending` só existe na criação.
    let target = ReviewStatus::parse(&payload.review_status)
        .filter(|s| *s != ReviewStatus::Pending)
        .ok_or_else(|| to_api(ValidationError::InvalidReviewStatus.into()))?;

    let lead = app_state
        .lead_service
        .set_review_status(&caller, &payload.invoice_no, target)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(lead)))
}

// POST /api/leads/{id}/whatsapp-sent
#[utoipa::path(
    post,
    path = "/api/leads/{id}/whatsapp-sent",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Envio registrado", body = LeadResponse),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_whatsapp_sent(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .mark_whatsapp_sent(&caller, lead_id, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// =============================================================================
//  ÁREA 2: ADMIN
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncentivePayload {
    #[serde(alias = "has_incentive")]
    #[schema(example = true)]
    pub has_incentive: bool,

    #[serde(default, alias = "incentive_amount")]
    #[schema(value_type = Option<f64>, example = 5000)]
    pub incentive_amount: Option<Decimal>,
}

// PATCH /api/admin/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/admin/leads/{id}",
    tag = "Admin",
    request_body = IncentivePayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Incentivo definido", body = LeadResponse),
        (status = 400, description = "Valor inválido"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Lead não encontrado"),
        (status = 409, description = "Lead ainda não revisado ou alterado por outra requisição")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_incentive(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: RequireAdmin,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<IncentivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .set_incentive(&admin.caller, lead_id, payload.has_incentive, payload.incentive_amount)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/admin/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/leads/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Lead excluído"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: RequireAdmin,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete_lead(&admin.caller, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeletePayload {
    #[validate(length(min = 1, message = "empty_selection"))]
    pub lead_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    #[schema(example = 3)]
    pub deleted_count: u64,
}

// POST /api/admin/leads/bulk-delete
#[utoipa::path(
    post,
    path = "/api/admin/leads/bulk-delete",
    tag = "Admin",
    request_body = BulkDeletePayload,
    responses(
        (status = 200, description = "Leads excluídos", body = BulkDeleteResponse),
        (status = 400, description = "Lista vazia"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Algum lead não pertence à organização; nada foi excluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_delete_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: RequireAdmin,
    Json(payload): Json<BulkDeletePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(e.into()))?;

    let deleted_count = app_state
        .lead_service
        .bulk_delete_leads(&admin.caller, &payload.lead_ids)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(BulkDeleteResponse { deleted_count })))
}
