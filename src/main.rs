use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use relax_shopping::batches::{BatchEventSink, ChannelSink, InMemoryBatchStore, TracingSink};
use relax_shopping::config::AppConfig;
use relax_shopping::{create_router, db, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG controls verbosity, info by default
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("RelaxShopping API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        "Pricing: service fee {}, VAT {}, delivery fee {}; batch threshold {}",
        config.pricing.service_fee_rate,
        config.pricing.vat_rate,
        config.pricing.delivery_fee,
        config.batches.default_threshold
    );

    // Batch events go to Postgres when a database is configured, otherwise to the log
    let mut writer = None;
    let sink: Arc<dyn BatchEventSink> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            let (tx, rx) = mpsc::unbounded_channel();
            writer = Some(tokio::spawn(db::run_batch_writer(pool, rx)));
            Arc::new(ChannelSink::new(tx))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, batch events will only be logged");
            Arc::new(TracingSink)
        }
    };

    let state = AppState::new(&config, Arc::new(InMemoryBatchStore::new()), sink);
    let batches = state.batches.clone();
    let app = create_router(state);

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("RelaxShopping API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    batches.metrics().log_summary();

    // The aggregator holds the last event sender; dropping it lets the writer drain and stop
    drop(batches);
    if let Some(writer) = writer {
        tracing::info!("Waiting for pending batch events to be persisted...");
        if let Err(e) = writer.await {
            tracing::error!("Batch persistence writer failed: {}", e);
        }
    }

    tracing::info!("RelaxShopping API stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
