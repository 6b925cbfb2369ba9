// src/handlers/cron.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    services::expiry::SweepReport,
};

// GET|POST /api/cron/auto-expire-leads
#[utoipa::path(
    post,
    path = "/api/cron/auto-expire-leads",
    tag = "Cron",
    responses(
        (status = 200, description = "Leads expirados nesta execução", body = SweepReport),
        (status = 401, description = "Segredo do cron ausente ou inválido")
    ),
    security(("cron_secret" = []))
)]
pub async fn auto_expire_leads(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .lead_service
        .run_auto_expiry_sweep(Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}
