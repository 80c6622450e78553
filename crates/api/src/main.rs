//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use api::config::Config;
use sqlx::postgres::PgPoolOptions;
use stock::{InMemoryStockStore, PostgresStockStore, StockStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the stock store: PostgreSQL when configured, memory otherwise
    let stock: Arc<dyn StockStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            sqlx::raw_sql(include_str!("../../../migrations/001_create_stock_tables.sql"))
                .execute(&pool)
                .await
                .expect("failed to run stock migrations");
            tracing::info!("using PostgreSQL stock store");
            Arc::new(PostgresStockStore::new(pool))
        }
        None => {
            tracing::info!("using in-memory stock store");
            Arc::new(InMemoryStockStore::new())
        }
    };

    // 4. Wire the ledgers, saga, and outbox
    let state = api::create_default_state(stock, config.internal_token.clone());

    // 5. Drain the saga retry outbox on an interval
    let coordinator = state.coordinator.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(10));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = coordinator.retry_pending().await;
            if stats.processed > 0 {
                tracing::info!(
                    processed = stats.processed,
                    completed = stats.completed,
                    failed = stats.failed,
                    rejected = stats.rejected,
                    "saga retry pass"
                );
            }
        }
    });

    // 6. Build and start the server
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
