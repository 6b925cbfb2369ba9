// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{InMemoryLeadStore, LeadStore, PgLeadStore},
    services::{CatalogService, LeadService},
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub cron_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Período do agendador interno da varredura. `None` = só o endpoint de cron.
    pub auto_expire_interval: Option<Duration>,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{name} deve ser definida"))
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let auto_expire_interval = match env::var("AUTO_EXPIRE_INTERVAL_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("AUTO_EXPIRE_INTERVAL_SECS inválida: '{raw}'"))?;
                anyhow::ensure!(secs > 0, "AUTO_EXPIRE_INTERVAL_SECS deve ser maior que zero");
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            jwt_secret: required("JWT_SECRET")?,
            cron_secret: required("CRON_SECRET")?,
            bind_addr: parsed("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            auto_expire_interval,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub lead_service: LeadService,
    pub catalog_service: CatalogService,
    pub jwt_secret: String,
    pub cron_secret: String,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    /// Monta o gráfico de dependências sobre um store já pronto.
    pub fn with_store(store: Arc<dyn LeadStore>, jwt_secret: String, cron_secret: String) -> Self {
        Self {
            lead_service: LeadService::new(store.clone()),
            catalog_service: CatalogService::new(store),
            jwt_secret,
            cron_secret,
            i18n_store: Arc::new(I18nStore::new()),
        }
    }

    /// Conecta ao Postgres (quando configurado) e devolve o estado e o pool.
    pub async fn new(config: &Config) -> anyhow::Result<(Self, Option<PgPool>)> {
        let (store, pool): (Arc<dyn LeadStore>, Option<PgPool>) = match &config.database_url {
            Some(database_url) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(config.db_acquire_timeout)
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                (Arc::new(PgLeadStore::new(pool.clone())), Some(pool))
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL ausente: usando armazenamento em memória (os dados somem ao reiniciar)");
                (Arc::new(InMemoryLeadStore::new()), None)
            }
        };

        let state = Self::with_store(store, config.jwt_secret.clone(), config.cron_secret.clone());
        Ok((state, pool))
    }
}
