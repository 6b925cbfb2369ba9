//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use lead_tracker::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG sobrescreve o nível padrão)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let (app_state, db_pool) = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    if let Some(pool) = &db_pool {
        sqlx::migrate!().run(pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    // Agendador interno da varredura (opcional; o cron externo continua valendo)
    let sweep_shutdown = config.auto_expire_interval.map(|period| {
        tracing::info!("⏱️ Varredura de expiração a cada {:?}", period);
        app_state.lead_service.start_auto_expiry_task(period)
    });

    let app = lead_tracker::app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Encerrando o servidor...");
        })
        .await?;

    if let Some(shutdown) = sweep_shutdown {
        shutdown.send(true).ok();
    }
    Ok(())
}
