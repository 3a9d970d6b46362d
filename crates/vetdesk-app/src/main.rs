use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use vetdesk_app::app::api::routes;
use vetdesk_app::store_handler::StoreHandler;
use vetdesk_core::config::{StorageBackend, load_config};
use vetdesk_core::error::CoreError;
use vetdesk_db::db::connection::{create_pool, run_migrations};
use vetdesk_db::store::RecordStore;
use vetdesk_db::store::memory::MemoryStore;
use vetdesk_db::store::postgres::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting VetDesk clinic scheduling server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let store: Arc<dyn RecordStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory record store with demo data");
            Arc::new(MemoryStore::with_demo_data())
        }
        StorageBackend::Postgres => {
            let database = config.database.as_ref().ok_or(CoreError::InvalidConfiguration(
                "storage.backend = postgres requires a [database] section".to_string(),
            ))?;

            run_migrations(&database.url).await?;
            let pool = create_pool(&database.url, u32::from(database.max_connections)).await?;

            tracing::info!("Database connection pool created.");
            Arc::new(PostgresStore::new(pool))
        }
    };

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new().hoop(StoreHandler { store }).push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
