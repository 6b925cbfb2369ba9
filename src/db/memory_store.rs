// src/db/memory_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{LeadFilter, LeadStore},
    models::{
        catalog::{Category, CategoryOrder, ProductModel},
        lead::{Incentive, Lead, LeadOutcome},
    },
    services::expiry::is_expiry_candidate,
};

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    models: Vec<ProductModel>,
    leads: Vec<Lead>,
}

/// Armazenamento em memória com as mesmas garantias do Postgres
/// (escopo por organização, nota fiscal única, exclusão tudo-ou-nada).
/// Usado nos testes e quando o serviço sobe sem `DATABASE_URL`.
#[derive(Default)]
pub struct InMemoryLeadStore {
    state: RwLock<State>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cadastra uma categoria com ordem explícita (seed de testes e de ambiente local).
    pub async fn seed_category(&self, organization_id: Uuid, name: &str, display_order: i32) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            organization_id,
            name: name.to_string(),
            display_order,
            created_at: Utc::now(),
        };
        self.state.write().await.categories.push(category.clone());
        category
    }

    /// Grava um lead como está, sem passar pelo intake (usado para montar cenários antigos).
    pub async fn put_lead(&self, lead: Lead) {
        let mut state = self.state.write().await;
        state.leads.retain(|l| l.id != lead.id);
        state.leads.push(lead);
    }

    pub async fn model_count(&self, organization_id: Uuid) -> usize {
        self.state
            .read()
            .await
            .models
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .count()
    }
}

fn matches(lead: &Lead, filter: &LeadFilter) -> bool {
    if filter.sales_rep_id.is_some_and(|id| id != lead.sales_rep_id) {
        return false;
    }
    if filter.status.is_some_and(|s| s != lead.status()) {
        return false;
    }
    if let Some(wanted) = filter.review_status {
        if lead.win().map(|w| w.review.status()) != Some(wanted) {
            return false;
        }
    }
    if filter.customer_phone.as_deref().is_some_and(|p| p != lead.customer_phone) {
        return false;
    }
    if filter.granted_incentive_only {
        let granted = matches!(lead.win().map(|w| &w.incentive), Some(Incentive::Granted(_)));
        if !granted {
            return false;
        }
    }
    true
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn find_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .iter()
            .find(|c| c.organization_id == organization_id && c.id == category_id)
            .cloned())
    }

    async fn list_categories(&self, organization_id: Uuid) -> Result<Vec<Category>, AppError> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state
            .categories
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn create_category(&self, organization_id: Uuid, name: &str) -> Result<Category, AppError> {
        let mut state = self.state.write().await;
        let next = state
            .categories
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .map(|c| c.display_order)
            .max()
            .unwrap_or(0)
            + 1;

        let category = Category {
            id: Uuid::new_v4(),
            organization_id,
            name: name.to_string(),
            display_order: next,
            created_at: Utc::now(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn reorder_categories(
        &self,
        organization_id: Uuid,
        orders: &[CategoryOrder],
    ) -> Result<(), AppError> {
        // Um único write lock: ninguém vê a reordenação pela metade.
        let mut state = self.state.write().await;
        for order in orders {
            if let Some(category) = state
                .categories
                .iter_mut()
                .find(|c| c.organization_id == organization_id && c.id == order.id)
            {
                category.display_order = order.display_order;
            }
        }
        Ok(())
    }

    async fn find_model(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
        name: &str,
    ) -> Result<Option<ProductModel>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .models
            .iter()
            .find(|m| m.organization_id == organization_id && m.category_id == category_id && m.name == name)
            .cloned())
    }

    async fn invoice_exists(&self, organization_id: Uuid, invoice_no: &str) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.leads.iter().any(|l| {
            l.organization_id == organization_id && l.win().is_some_and(|w| w.invoice_no == invoice_no)
        }))
    }

    async fn insert_lead(&self, lead: &Lead, new_model: Option<&ProductModel>) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        // Mesmo papel da constraint UNIQUE do banco.
        if let Some(win) = lead.win() {
            let taken = state.leads.iter().any(|l| {
                l.organization_id == lead.organization_id
                    && l.win().is_some_and(|w| w.invoice_no == win.invoice_no)
            });
            if taken {
                return Err(AppError::DuplicateInvoice(win.invoice_no.clone()));
            }
        }

        if let Some(model) = new_model {
            state.models.push(model.clone());
        }
        state.leads.push(lead.clone());
        Ok(())
    }

    async fn find_lead(&self, organization_id: Uuid, lead_id: Uuid) -> Result<Option<Lead>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .leads
            .iter()
            .find(|l| l.organization_id == organization_id && l.id == lead_id)
            .cloned())
    }

    async fn find_win_lead_by_invoice(
        &self,
        organization_id: Uuid,
        invoice_no: &str,
    ) -> Result<Option<Lead>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .leads
            .iter()
            .find(|l| {
                l.organization_id == organization_id && l.win().is_some_and(|w| w.invoice_no == invoice_no)
            })
            .cloned())
    }

    async fn compare_and_set_review(&self, previous: &Lead, updated: &Lead) -> Result<bool, AppError> {
        let (Some(expected), Some(next)) = (previous.win(), updated.win()) else {
            return Err(AppError::LeadNotFound);
        };

        let mut state = self.state.write().await;
        let slot = state
            .leads
            .iter_mut()
            .find(|l| l.organization_id == previous.organization_id && l.id == previous.id)
            .ok_or(AppError::LeadNotFound)?;
        let LeadOutcome::Win(win) = &mut slot.outcome else {
            return Err(AppError::LeadNotFound);
        };

        if win.review != expected.review || win.incentive != expected.incentive {
            return Ok(false);
        }
        win.review = next.review.clone();
        win.incentive = next.incentive.clone();
        slot.updated_at = updated.updated_at;
        Ok(true)
    }

    async fn mark_whatsapp_sent(
        &self,
        organization_id: Uuid,
        lead_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let slot = state
            .leads
            .iter_mut()
            .find(|l| l.organization_id == organization_id && l.id == lead_id)
            .ok_or(AppError::LeadNotFound)?;

        if slot.whatsapp_sent {
            return Ok(false);
        }
        slot.whatsapp_sent = true;
        slot.whatsapp_sent_at = Some(at);
        slot.updated_at = at;
        Ok(true)
    }

    async fn list_leads(&self, organization_id: Uuid, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        let state = self.state.read().await;
        let mut leads: Vec<Lead> = state
            .leads
            .iter()
            .rev()
            .filter(|l| l.organization_id == organization_id && matches(l, filter))
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn delete_leads(&self, organization_id: Uuid, lead_ids: &[Uuid]) -> Result<u64, AppError> {
        let mut state = self.state.write().await;

        let all_owned = lead_ids.iter().all(|id| {
            state
                .leads
                .iter()
                .any(|l| l.organization_id == organization_id && l.id == *id)
        });
        if !all_owned {
            return Err(AppError::LeadNotFound);
        }

        let before = state.leads.len();
        state
            .leads
            .retain(|l| !(l.organization_id == organization_id && lead_ids.contains(&l.id)));
        Ok((before - state.leads.len()) as u64)
    }

    async fn list_expiry_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Lead>, AppError> {
        let state = self.state.read().await;
        let mut leads: Vec<Lead> = state
            .leads
            .iter()
            .filter(|l| is_expiry_candidate(l, cutoff))
            .cloned()
            .collect();
        leads.sort_by_key(|l| l.updated_at);
        Ok(leads)
    }

    async fn apply_expiry(&self, expired: &[Lead], cutoff: DateTime<Utc>) -> Result<Vec<Uuid>, AppError> {
        let mut state = self.state.write().await;
        let mut updated = Vec::with_capacity(expired.len());

        for lead in expired {
            let Some(fresh) = lead.lost() else {
                continue;
            };
            let Some(slot) = state.leads.iter_mut().find(|l| l.id == lead.id) else {
                continue;
            };
            if slot.updated_at >= cutoff {
                continue;
            }
            let LeadOutcome::Lost(lost) = &mut slot.outcome else {
                continue;
            };
            if lost.auto_expired_at.is_some() {
                continue;
            }

            lost.not_today_reason = fresh.not_today_reason.clone();
            lost.auto_expired_at = fresh.auto_expired_at;
            slot.updated_at = lead.updated_at;
            updated.push(lead.id);
        }

        Ok(updated)
    }
}
