// src/db/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{Category, CategoryOrder, ProductModel},
        lead::{Lead, LeadStatus, ReviewStatus},
    },
};

/// Filtros de listagem. Todos opcionais e sempre combinados com a organização.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub sales_rep_id: Option<Uuid>,
    pub status: Option<LeadStatus>,
    pub review_status: Option<ReviewStatus>,
    pub customer_phone: Option<String>,
    /// Apenas Win com incentivo concedido (tela "meus incentivos").
    pub granted_incentive_only: bool,
}

/// O armazenamento persistente de leads, modelos e categorias.
/// Toda leitura e escrita recebe a organização; a única exceção é a varredura de expiração,
/// que roda para todos os tenants.
#[async_trait]
pub trait LeadStore: Send + Sync {
    // --- CATEGORIAS ---

    async fn find_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, AppError>;

    /// Ordenadas por `display_order` e depois por nome.
    async fn list_categories(&self, organization_id: Uuid) -> Result<Vec<Category>, AppError>;

    /// Cria no fim da lista (`display_order` = maior + 1).
    async fn create_category(&self, organization_id: Uuid, name: &str) -> Result<Category, AppError>;

    /// Aplica tudo ou nada. Ids de outra organização são ignorados.
    async fn reorder_categories(
        &self,
        organization_id: Uuid,
        orders: &[CategoryOrder],
    ) -> Result<(), AppError>;

    // --- MODELOS ---

    /// Busca exata (sensível a maiúsculas) pelo nome já aparado.
    async fn find_model(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
        name: &str,
    ) -> Result<Option<ProductModel>, AppError>;

    // --- LEADS ---

    async fn invoice_exists(&self, organization_id: Uuid, invoice_no: &str) -> Result<bool, AppError>;

    /// Grava o lead e, se houver, o modelo novo na mesma transação.
    /// Nota fiscal repetida na organização vira `DuplicateInvoice`.
    async fn insert_lead(&self, lead: &Lead, new_model: Option<&ProductModel>) -> Result<(), AppError>;

    async fn find_lead(&self, organization_id: Uuid, lead_id: Uuid) -> Result<Option<Lead>, AppError>;

    async fn find_win_lead_by_invoice(
        &self,
        organization_id: Uuid,
        invoice_no: &str,
    ) -> Result<Option<Lead>, AppError>;

    /// Grava revisão e incentivo de um lead Win (e `updated_at`), desde que essas colunas
    /// ainda estejam como em `previous`. `Ok(false)` quando outra escrita chegou antes;
    /// `LeadNotFound` se o lead não existir na organização.
    async fn compare_and_set_review(&self, previous: &Lead, updated: &Lead) -> Result<bool, AppError>;

    /// Marca o WhatsApp como enviado se ainda não estiver. Só toca as colunas do envio e
    /// `updated_at`; `Ok(false)` se já estava marcado. `LeadNotFound` se o lead não existir.
    async fn mark_whatsapp_sent(
        &self,
        organization_id: Uuid,
        lead_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Mais recentes primeiro.
    async fn list_leads(&self, organization_id: Uuid, filter: &LeadFilter) -> Result<Vec<Lead>, AppError>;

    /// Tudo ou nada: se algum id não pertencer à organização, nada é apagado (`LeadNotFound`).
    async fn delete_leads(&self, organization_id: Uuid, lead_ids: &[Uuid]) -> Result<u64, AppError>;

    // --- VARREDURA DE EXPIRAÇÃO ---

    /// Leads Lost parados desde antes de `cutoff`, com prazo diferente de `today`
    /// e ainda sem a marca de expiração.
    async fn list_expiry_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Lead>, AppError>;

    /// Grava só o motivo, a marca de expiração e `updated_at` dos leads já expirados, numa
    /// única transação. O guarda da seleção é repetido na escrita: lead já expirado ou tocado
    /// depois de `cutoff` fica como está. Retorna os ids efetivamente atualizados.
    async fn apply_expiry(&self, expired: &[Lead], cutoff: DateTime<Utc>) -> Result<Vec<Uuid>, AppError>;
}
