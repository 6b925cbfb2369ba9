// src/services/catalog_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::LeadStore,
    models::{
        auth::CallerContext,
        catalog::{Category, CategoryOrder},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LeadStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    pub async fn list_categories(&self, ctx: &CallerContext) -> Result<Vec<Category>, AppError> {
        self.store.list_categories(ctx.organization_id).await
    }

    /// O nome já chega validado pelo handler; aqui só aparamos.
    pub async fn create_category(&self, ctx: &CallerContext, name: &str) -> Result<Category, AppError> {
        ctx.require_admin()?;

        let category = self.store.create_category(ctx.organization_id, name.trim()).await?;
        tracing::info!(
            category_id = %category.id,
            display_order = category.display_order,
            "Categoria criada"
        );
        Ok(category)
    }

    pub async fn reorder_categories(
        &self,
        ctx: &CallerContext,
        orders: &[CategoryOrder],
    ) -> Result<Vec<Category>, AppError> {
        ctx.require_admin()?;

        self.store.reorder_categories(ctx.organization_id, orders).await?;
        self.store.list_categories(ctx.organization_id).await
    }
}
