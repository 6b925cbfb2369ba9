// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, cron::cron_guard};

/// O router completo da aplicação.
pub fn app(app_state: AppState) -> Router {
    // Rotas do vendedor (qualquer usuário autenticado)
    let lead_routes = Router::new()
        .route(
            "/",
            post(handlers::leads::create_lead).get(handlers::leads::list_leads),
        )
        .route("/my-incentives", get(handlers::leads::my_incentives))
        .route("/review-status", put(handlers::leads::update_review_status))
        .route("/{id}/whatsapp-sent", post(handlers::leads::mark_whatsapp_sent));

    // Rotas de admin (o papel é conferido pelo extrator RequireAdmin)
    let admin_routes = Router::new()
        .route(
            "/leads/{id}",
            patch(handlers::leads::set_incentive).delete(handlers::leads::delete_lead),
        )
        .route("/leads/bulk-delete", post(handlers::leads::bulk_delete_leads));

    let category_routes = Router::new()
        .route(
            "/",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route("/reorder", put(handlers::categories::reorder_categories));

    let customer_routes = Router::new()
        .route("/{phone}", get(handlers::customers::customer_history));

    let authenticated = Router::new()
        .nest("/api/leads", lead_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/customers", customer_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cron_routes = Router::new()
        .route(
            "/auto-expire-leads",
            get(handlers::cron::auto_expire_leads).post(handlers::cron::auto_expire_leads),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            cron_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(authenticated)
        .nest("/api/cron", cron_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
