use std::sync::Arc;
use anyhow::Context;
use aula_admin::{
    app, bootstrap,
    config::{Config, StorageBackend},
    services::{DocumentStore, MemoryStore, RedisStore, Repository},
    state::AppState,
    worker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    let store: Arc<dyn DocumentStore> = match config.storage.backend {
        StorageBackend::Redis => {
            let url = config.redis_url().context("Sentinel URL not configured")?;
            let client = redis::Client::open(url).context("Failed to connect to Redis")?;
            Arc::new(RedisStore::new(Arc::new(client)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let repo = Repository::new(store);

    if let Some(admin) = &config.bootstrap {
        bootstrap::ensure_admin(&repo, admin, &config.security)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    // Close time records abandoned without a final flush
    let sweeper_repo = repo.clone();
    let tracking = config.tracking.clone();
    tokio::spawn(async move {
        worker::sweeper::sweeper_process(sweeper_repo, tracking).await;
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = app::build_router(AppState::new(repo, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind server to {}", addr))?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Failed to start server")?;

    Ok(())
}
