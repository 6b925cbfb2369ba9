// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::lead::LeadResponse;

// Resumo de um cliente (telefone) dentro da organização
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "Ravi Kumar")]
    pub name: String,
    pub lead_count: usize,
    pub win_count: usize,
    pub lost_count: usize,
    pub total_value: Decimal,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub customer: CustomerSummary,
    pub leads: Vec<LeadResponse>,
}
