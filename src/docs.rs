// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::my_incentives,
        handlers::leads::update_review_status,
        handlers::leads::mark_whatsapp_sent,

        // --- Admin ---
        handlers::leads::set_incentive,
        handlers::leads::delete_lead,
        handlers::leads::bulk_delete_leads,

        // --- Categorias ---
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::categories::reorder_categories,

        // --- Clientes ---
        handlers::customers::customer_history,

        // --- Cron ---
        handlers::cron::auto_expire_leads,
    ),
    components(
        schemas(
            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::ReviewStatus,
            models::lead::PurchaseTimeline,
            models::lead::ReasonCode,
            models::lead::ScoreCategory,
            models::lead::LeadRow,
            models::lead::LeadResponse,
            services::expiry::SweepReport,

            // --- Catálogo ---
            models::catalog::Category,
            models::catalog::CategoryOrder,

            // --- Clientes ---
            models::customer::CustomerSummary,
            models::customer::CustomerHistory,

            // --- Payloads ---
            services::intake::CreateLeadPayload,
            handlers::leads::ReviewStatusPayload,
            handlers::leads::IncentivePayload,
            handlers::leads::BulkDeletePayload,
            handlers::leads::BulkDeleteResponse,
            handlers::categories::CreateCategoryPayload,
            handlers::categories::ReorderCategoriesPayload,
        )
    ),
    tags(
        (name = "Leads", description = "Registro de vendas e oportunidades perdidas"),
        (name = "Admin", description = "Incentivos e exclusão de leads"),
        (name = "Categorias", description = "Catálogo de categorias da organização"),
        (name = "Clientes", description = "Histórico por telefone"),
        (name = "Cron", description = "Varredura de expiração de leads")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        components.add_security_scheme(
            "cron_secret",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
