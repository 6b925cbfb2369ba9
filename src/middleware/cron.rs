// src/middleware/cron.rs

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

// Rotas de cron não têm usuário: o agendador externo manda o segredo compartilhado.
pub async fn cron_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = bearer
        .is_some_and(|TypedHeader(auth)| auth.token() == app_state.cron_secret);

    if !authorized {
        tracing::warn!("Chamada de cron recusada: segredo ausente ou inválido");
        return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(next.run(request).await)
}
