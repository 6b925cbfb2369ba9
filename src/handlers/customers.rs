// src/handlers/customers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::customer::CustomerHistory,
};

// GET /api/customers/{phone}
#[utoipa::path(
    get,
    path = "/api/customers/{phone}",
    tag = "Clientes",
    params(("phone" = String, Path, description = "Telefone de 10 dígitos")),
    responses(
        (status = 200, description = "Resumo e histórico de leads do cliente", body = CustomerHistory),
        (status = 404, description = "Nenhum lead com esse telefone na organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn customer_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(phone): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .lead_service
        .customer_history(&caller, &phone)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(history)))
}
