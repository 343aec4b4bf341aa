use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use study_helper_api::config::AppConfig;
use study_helper_api::content::DocumentExtractor;
use study_helper_api::database::{self, MemoryRepository, PgRepository, Repository};
use study_helper_api::services::{GeminiClient, SupabaseStorage};
use study_helper_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("study_helper_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Study Helper API in {:?} mode", config.environment);

    let repo: Arc<dyn Repository> = match config.database.url {
        Some(_) => {
            let pool = database::connect(&config.database).await?;
            database::migrate(&pool).await?;
            Arc::new(PgRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory repository. Data is lost on exit.");
            Arc::new(MemoryRepository::new())
        }
    };

    let storage = SupabaseStorage::new(&config.identity, &config.storage)
        .context("object store client")?;
    let generator = GeminiClient::new(&config.generation).context("generation client")?;

    let bind_addr = config.server_address();
    let state = AppState::new(
        config,
        repo,
        Arc::new(storage),
        Arc::new(DocumentExtractor::new()),
        Arc::new(generator),
    )?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Study Helper API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
