// src/db/lead_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{LeadFilter, LeadStore},
    models::{
        catalog::{Category, CategoryOrder, ProductModel},
        lead::{Lead, LeadRow},
    },
    services::expiry::AUTO_EXPIRE_MARKER,
};

/// Nome do índice parcial criado na migração.
const INVOICE_UNIQUE_INDEX: &str = "idx_leads_org_invoice";

// O repositório de leads em Postgres
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_model<'e, E>(&self, executor: E, model: &ProductModel) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO models (id, organization_id, category_id, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(model.id)
        .bind(model.organization_id)
        .bind(model.category_id)
        .bind(&model.name)
        .bind(model.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}

fn into_leads(rows: Vec<LeadRow>) -> Result<Vec<Lead>, AppError> {
    rows.into_iter().map(Lead::try_from).collect()
}

#[async_trait]
impl LeadStore for PgLeadStore {
    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    async fn find_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE organization_id = $1 AND id = $2",
        )
        .bind(organization_id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn list_categories(&self, organization_id: Uuid) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE organization_id = $1
            ORDER BY display_order ASC, name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn create_category(&self, organization_id: Uuid, name: &str) -> Result<Category, AppError> {
        // A próxima posição é calculada na mesma instrução do INSERT.
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, organization_id, name, display_order)
            SELECT $1, $2, $3, COALESCE(MAX(display_order), 0) + 1
            FROM categories
            WHERE organization_id = $2
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn reorder_categories(
        &self,
        organization_id: Uuid,
        orders: &[CategoryOrder],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for order in orders {
            sqlx::query(
                "UPDATE categories SET display_order = $1 WHERE id = $2 AND organization_id = $3",
            )
            .bind(order.display_order)
            .bind(order.id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  MODELOS
    // =========================================================================

    async fn find_model(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
        name: &str,
    ) -> Result<Option<ProductModel>, AppError> {
        // Sem UNIQUE na tabela: se a corrida criou duplicados, usamos o mais antigo.
        let model = sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT * FROM models
            WHERE organization_id = $1 AND category_id = $2 AND name = $3
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(category_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(model)
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    async fn invoice_exists(&self, organization_id: Uuid, invoice_no: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM leads
                WHERE organization_id = $1 AND invoice_no = $2 AND status = 'win'
            )
            "#,
        )
        .bind(organization_id)
        .bind(invoice_no)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_lead(&self, lead: &Lead, new_model: Option<&ProductModel>) -> Result<(), AppError> {
        let row = LeadRow::from(lead);

        // Modelo e lead entram juntos ou não entram.
        let mut tx = self.pool.begin().await?;

        if let Some(model) = new_model {
            self.insert_model(&mut *tx, model).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO leads (
                id, organization_id, sales_rep_id, customer_name, customer_phone, category_id, status,
                invoice_no, sale_price, review_status, reviewed_by, has_incentive, incentive_amount,
                deal_size, model_id, purchase_timeline, not_today_reason, other_reason, lead_rating,
                auto_expired_at, whatsapp_sent, whatsapp_sent_at, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19,
                $20, $21, $22, $23, $24
            )
            "#,
        )
        .bind(row.id)
        .bind(row.organization_id)
        .bind(row.sales_rep_id)
        .bind(&row.customer_name)
        .bind(&row.customer_phone)
        .bind(row.category_id)
        .bind(row.status)
        .bind(&row.invoice_no)
        .bind(row.sale_price)
        .bind(row.review_status)
        .bind(row.reviewed_by)
        .bind(row.has_incentive)
        .bind(row.incentive_amount)
        .bind(row.deal_size)
        .bind(row.model_id)
        .bind(row.purchase_timeline)
        .bind(row.not_today_reason)
        .bind(&row.other_reason)
        .bind(row.lead_rating)
        .bind(row.auto_expired_at)
        .bind(row.whatsapp_sent)
        .bind(row.whatsapp_sent_at)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // O índice único (organization_id, invoice_no) é a palavra final na corrida.
            invoice_conflict(&e, row.invoice_no.as_deref()).unwrap_or_else(|| e.into())
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_lead(&self, organization_id: Uuid, lead_id: Uuid) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(
            "SELECT * FROM leads WHERE organization_id = $1 AND id = $2",
        )
        .bind(organization_id)
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lead::try_from).transpose()
    }

    async fn find_win_lead_by_invoice(
        &self,
        organization_id: Uuid,
        invoice_no: &str,
    ) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT * FROM leads
            WHERE organization_id = $1 AND invoice_no = $2 AND status = 'win'
            "#,
        )
        .bind(organization_id)
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lead::try_from).transpose()
    }

    async fn compare_and_set_review(&self, previous: &Lead, updated: &Lead) -> Result<bool, AppError> {
        let before = LeadRow::from(previous);
        let after = LeadRow::from(updated);

        // Só as colunas da revisão; o WHERE confere que ninguém as mudou desde a leitura.
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                review_status = $3,
                reviewed_by = $4,
                has_incentive = $5,
                incentive_amount = $6,
                updated_at = $7
            WHERE id = $1 AND organization_id = $2
              AND status = 'win'
              AND review_status = $8
              AND reviewed_by IS NOT DISTINCT FROM $9
              AND has_incentive IS NOT DISTINCT FROM $10
              AND incentive_amount IS NOT DISTINCT FROM $11
            "#,
        )
        .bind(after.id)
        .bind(after.organization_id)
        .bind(after.review_status)
        .bind(after.reviewed_by)
        .bind(after.has_incentive)
        .bind(after.incentive_amount)
        .bind(after.updated_at)
        .bind(before.review_status)
        .bind(before.reviewed_by)
        .bind(before.has_incentive)
        .bind(before.incentive_amount)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.find_lead(previous.organization_id, previous.id).await?.is_none() {
            return Err(AppError::LeadNotFound);
        }
        Ok(false)
    }

    async fn mark_whatsapp_sent(
        &self,
        organization_id: Uuid,
        lead_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                whatsapp_sent = true,
                whatsapp_sent_at = $3,
                updated_at = $3
            WHERE organization_id = $1 AND id = $2 AND whatsapp_sent = false
            "#,
        )
        .bind(organization_id)
        .bind(lead_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.find_lead(organization_id, lead_id).await?.is_none() {
            return Err(AppError::LeadNotFound);
        }
        Ok(false)
    }

    async fn list_leads(&self, organization_id: Uuid, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT * FROM leads
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR sales_rep_id = $2)
              AND ($3::lead_status IS NULL OR status = $3)
              AND ($4::review_status IS NULL OR review_status = $4)
              AND ($5::text IS NULL OR customer_phone = $5)
              AND ($6 = false OR (has_incentive = true AND incentive_amount IS NOT NULL))
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(filter.sales_rep_id)
        .bind(filter.status)
        .bind(filter.review_status)
        .bind(&filter.customer_phone)
        .bind(filter.granted_incentive_only)
        .fetch_all(&self.pool)
        .await?;

        into_leads(rows)
    }

    async fn delete_leads(&self, organization_id: Uuid, lead_ids: &[Uuid]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let owned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM leads WHERE organization_id = $1 AND id = ANY($2)",
        )
        .bind(organization_id)
        .bind(lead_ids)
        .fetch_one(&mut *tx)
        .await?;

        if owned as usize != lead_ids.len() {
            // O drop da transação faz o rollback.
            return Err(AppError::LeadNotFound);
        }

        let result = sqlx::query("DELETE FROM leads WHERE organization_id = $1 AND id = ANY($2)")
            .bind(organization_id)
            .bind(lead_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  VARREDURA DE EXPIRAÇÃO
    // =========================================================================

    async fn list_expiry_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT * FROM leads
            WHERE status = 'lost'
              AND updated_at < $1
              AND purchase_timeline IN ('3_days', '7_days', '30_days')
              AND auto_expired_at IS NULL
              AND (other_reason IS NULL OR strpos(other_reason, $2) = 0)
            ORDER BY updated_at ASC
            "#,
        )
        .bind(cutoff)
        .bind(AUTO_EXPIRE_MARKER)
        .fetch_all(&self.pool)
        .await?;

        into_leads(rows)
    }

    async fn apply_expiry(&self, expired: &[Lead], cutoff: DateTime<Utc>) -> Result<Vec<Uuid>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(expired.len());

        for lead in expired {
            let row = LeadRow::from(lead);

            // Repete o guarda da seleção: execução sobreposta ou lead tocado depois da leitura fica de fora.
            let id: Option<Uuid> = sqlx::query_scalar(
                r#"
                UPDATE leads SET
                    not_today_reason = $2,
                    other_reason = $3,
                    auto_expired_at = $4,
                    updated_at = $5
                WHERE id = $1
                  AND status = 'lost'
                  AND auto_expired_at IS NULL
                  AND updated_at < $6
                RETURNING id
                "#,
            )
            .bind(row.id)
            .bind(row.not_today_reason)
            .bind(&row.other_reason)
            .bind(row.auto_expired_at)
            .bind(row.updated_at)
            .bind(cutoff)
            .fetch_optional(&mut *tx)
            .await?;

            updated.extend(id);
        }

        tx.commit().await?;
        Ok(updated)
    }
}

/// Só a violação do índice único de nota fiscal vira `DuplicateInvoice`;
/// qualquer outra constraint segue como erro de banco.
fn invoice_conflict(err: &sqlx::Error, invoice_no: Option<&str>) -> Option<AppError> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    (db_err.is_unique_violation() && db_err.constraint() == Some(INVOICE_UNIQUE_INDEX))
        .then(|| AppError::DuplicateInvoice(invoice_no.unwrap_or_default().to_string()))
}
