// src/services/lead_service.rs

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadFilter, LeadStore},
    models::{
        auth::CallerContext,
        customer::{CustomerHistory, CustomerSummary},
        lead::{Lead, LeadResponse, LeadStatus, ReviewStatus},
    },
    services::{
        expiry::{self, SweepReport},
        intake::{self, CreateLeadPayload},
        review,
        scoring::decorate,
    },
};

/// Quantas vezes uma mudança de revisão é relida e reaplicada quando outra escrita chega antes.
const REVIEW_WRITE_ATTEMPTS: usize = 3;

/// Filtros opcionais da listagem de leads.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
    pub review_status: Option<ReviewStatus>,
}

#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  1. CRIAÇÃO
    // =========================================================================

    pub async fn create_lead(
        &self,
        ctx: &CallerContext,
        payload: &CreateLeadPayload,
    ) -> Result<LeadResponse, AppError> {
        let prepared = intake::prepare(self.store.as_ref(), ctx, payload, Utc::now()).await?;

        self.store
            .insert_lead(&prepared.lead, prepared.new_model.as_ref())
            .await?;

        tracing::info!(
            lead_id = %prepared.lead.id,
            org = %ctx.organization_id,
            status = ?prepared.lead.status(),
            new_model = prepared.new_model.is_some(),
            "Lead criado"
        );

        Ok(decorate(&prepared.lead))
    }

    // =========================================================================
    //  2. REVISÃO E INCENTIVO
    // =========================================================================

    pub async fn set_review_status(
        &self,
        ctx: &CallerContext,
        invoice_no: &str,
        target: ReviewStatus,
    ) -> Result<LeadResponse, AppError> {
        let lead = self
            .store
            .find_win_lead_by_invoice(ctx.organization_id, invoice_no.trim())
            .await?
            .ok_or(AppError::LeadNotFound)?;

        let updated = self
            .write_review(lead, |current| {
                review::set_review_status(current, target, ctx.user_id, Utc::now())
            })
            .await?;

        tracing::info!(
            lead_id = %updated.id,
            by = %ctx.user_id,
            review_status = ?target,
            "Status de revisão atualizado"
        );

        Ok(decorate(&updated))
    }

    /// Só admin. Lead de outra organização (ou inexistente) é sempre `LeadNotFound`.
    pub async fn set_incentive(
        &self,
        ctx: &CallerContext,
        lead_id: Uuid,
        has_incentive: bool,
        amount: Option<Decimal>,
    ) -> Result<LeadResponse, AppError> {
        ctx.require_admin()?;

        let lead = self
            .store
            .find_lead(ctx.organization_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        let updated = self
            .write_review(lead, |current| {
                review::set_incentive(current, has_incentive, amount, Utc::now())
            })
            .await?;

        tracing::info!(
            lead_id = %lead_id,
            admin = %ctx.user_id,
            has_incentive,
            "Incentivo definido"
        );

        Ok(decorate(&updated))
    }

    /// Aplica `change` e grava só as colunas da revisão, condicionado ao estado lido.
    /// Se outra escrita chegou antes, relê o lead e reaplica a regra sobre o estado atual.
    async fn write_review<F>(&self, mut lead: Lead, change: F) -> Result<Lead, AppError>
    where
        F: Fn(&Lead) -> Result<Lead, AppError> + Send + Sync,
    {
        for _ in 0..REVIEW_WRITE_ATTEMPTS {
            let updated = change(&lead)?;
            if updated == lead || self.store.compare_and_set_review(&lead, &updated).await? {
                return Ok(updated);
            }

            tracing::debug!(lead_id = %lead.id, "Revisão mudou desde a leitura; relendo");
            lead = self
                .store
                .find_lead(lead.organization_id, lead.id)
                .await?
                .ok_or(AppError::LeadNotFound)?;
        }

        tracing::warn!(lead_id = %lead.id, "Revisão não gravada: escritas concorrentes demais");
        Err(AppError::ConcurrentUpdate)
    }

    // =========================================================================
    //  3. VARREDURA DE EXPIRAÇÃO
    // =========================================================================

    /// Expira os leads Lost abandonados. Tudo ou nada por execução.
    pub async fn run_auto_expiry_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let cutoff = expiry::cutoff(now);
        let candidates = self.store.list_expiry_candidates(cutoff).await?;
        if candidates.is_empty() {
            tracing::info!("Varredura de expiração: nenhum lead para expirar");
            return Ok(SweepReport {
                expired_count: 0,
                leads: Vec::new(),
            });
        }

        let expired: Vec<_> = candidates.iter().map(|lead| expiry::expire(lead, now)).collect();
        let applied = self.store.apply_expiry(&expired, cutoff).await?;

        let leads: Vec<LeadResponse> = expired
            .iter()
            .filter(|lead| applied.contains(&lead.id))
            .map(decorate)
            .collect();

        tracing::info!(
            candidates = candidates.len(),
            expired = leads.len(),
            "Varredura de expiração concluída"
        );

        Ok(SweepReport {
            expired_count: leads.len(),
            leads,
        })
    }

    /// Roda a varredura a cada `period` até o sender receber `true`.
    /// Uma falha numa execução fica no log e a próxima tenta de novo.
    pub fn start_auto_expiry_task(&self, period: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let service = self.clone();

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        if let Err(e) = service.run_auto_expiry_sweep(Utc::now()).await {
                            tracing::error!("Varredura de expiração falhou: {}", e);
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Agendador de expiração encerrado");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    // =========================================================================
    //  4. CONSULTAS
    // =========================================================================

    /// Admin vê a organização inteira; vendedor só os próprios leads.
    pub async fn list_leads(
        &self,
        ctx: &CallerContext,
        query: LeadQuery,
    ) -> Result<Vec<LeadResponse>, AppError> {
        let filter = LeadFilter {
            sales_rep_id: (!ctx.is_admin()).then_some(ctx.user_id),
            status: query.status,
            review_status: query.review_status,
            ..Default::default()
        };

        let leads = self.store.list_leads(ctx.organization_id, &filter).await?;
        Ok(leads.iter().map(decorate).collect())
    }

    pub async fn my_incentives(&self, ctx: &CallerContext) -> Result<Vec<LeadResponse>, AppError> {
        let filter = LeadFilter {
            sales_rep_id: Some(ctx.user_id),
            status: Some(LeadStatus::Win),
            granted_incentive_only: true,
            ..Default::default()
        };

        let leads = self.store.list_leads(ctx.organization_id, &filter).await?;
        Ok(leads.iter().map(decorate).collect())
    }

    pub async fn customer_history(
        &self,
        ctx: &CallerContext,
        phone: &str,
    ) -> Result<CustomerHistory, AppError> {
        let filter = LeadFilter {
            customer_phone: Some(phone.trim().to_string()),
            ..Default::default()
        };

        // Mais recentes primeiro: o primeiro é a última visita e carrega o nome atual.
        let leads = self.store.list_leads(ctx.organization_id, &filter).await?;
        let (Some(latest), Some(earliest)) = (leads.first(), leads.last()) else {
            return Err(AppError::CustomerNotFound);
        };

        let customer = CustomerSummary {
            phone: latest.customer_phone.clone(),
            name: latest.customer_name.clone(),
            lead_count: leads.len(),
            win_count: leads.iter().filter(|l| l.status() == LeadStatus::Win).count(),
            lost_count: leads.iter().filter(|l| l.status() == LeadStatus::Lost).count(),
            total_value: leads.iter().map(|l| l.value()).sum(),
            first_visit: earliest.created_at,
            last_visit: latest.created_at,
        };

        Ok(CustomerHistory {
            customer,
            leads: leads.iter().map(decorate).collect(),
        })
    }

    // =========================================================================
    //  5. ADMINISTRAÇÃO
    // =========================================================================

    pub async fn delete_lead(&self, ctx: &CallerContext, lead_id: Uuid) -> Result<(), AppError> {
        ctx.require_admin()?;
        self.store.delete_leads(ctx.organization_id, &[lead_id]).await?;
        tracing::info!(lead_id = %lead_id, admin = %ctx.user_id, "Lead excluído");
        Ok(())
    }

    pub async fn bulk_delete_leads(&self, ctx: &CallerContext, lead_ids: &[Uuid]) -> Result<u64, AppError> {
        ctx.require_admin()?;

        let mut ids = lead_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let deleted = self.store.delete_leads(ctx.organization_id, &ids).await?;
        tracing::info!(deleted, admin = %ctx.user_id, "Leads excluídos em lote");
        Ok(deleted)
    }

    /// Chamado depois que o WhatsApp foi entregue. A primeira marcação vale.
    pub async fn mark_whatsapp_sent(
        &self,
        ctx: &CallerContext,
        lead_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<LeadResponse, AppError> {
        let first = self.store.mark_whatsapp_sent(ctx.organization_id, lead_id, at).await?;
        if first {
            tracing::info!(lead_id = %lead_id, "WhatsApp registrado como enviado");
        }

        // Relê para devolver o estado gravado, inclusive o que outras escritas mudaram.
        let lead = self
            .store
            .find_lead(ctx.organization_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;
        Ok(decorate(&lead))
    }
}
