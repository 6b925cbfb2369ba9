// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Category (a "Vitrine")
// ---
// Classificação obrigatória de todo lead, sempre dentro de uma organização.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    #[schema(example = "Refrigerators")]
    pub name: String,
    #[schema(example = 1)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

// ---
// 2. ProductModel (o "Modelo")
// ---
// Criado sob demanda na primeira vez que um vendedor digita o nome num lead Lost.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductModel {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub category_id: Uuid,
    #[schema(example = "Frost Free 350L")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl ProductModel {
    pub fn new(organization_id: Uuid, category_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            category_id,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Como o intake resolveu o modelo de um lead Lost.
#[derive(Debug, Clone)]
pub enum ModelResolution {
    Existing(Uuid),
    /// Deve ser gravado na mesma transação do lead.
    Create(ProductModel),
}

impl ModelResolution {
    pub fn model_id(&self) -> Uuid {
        match self {
            Self::Existing(id) => *id,
            Self::Create(model) => model.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOrder {
    pub id: Uuid,
    #[serde(alias = "display_order")]
    #[schema(example = 2)]
    pub display_order: i32,
}
