//! Promotion Ledger - promotion codes for the ecommerce admin backend

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;

use promotion_ledger::{
    config::{Config, Storage},
    events::EventPublisher,
    http::{router, AppState},
    promotions::{
        Ledger, MemoryPromotionsRepository, PgPromotionsRepository, PromotionsRepository,
    },
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    telemetry::init(&config).context("failed to install tracing subscriber")?;

    let promotions: Arc<dyn PromotionsRepository> = match config.storage() {
        Storage::Postgres(url) => {
            let db = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&url)
                .await
                .context("failed to connect to database")?;
            let repository = PgPromotionsRepository::new(db);
            repository.migrate().await.context("failed to run migrations")?;
            Arc::new(repository)
        }
        Storage::Memory => {
            tracing::warn!("DATABASE_URL not set, promotions are kept in memory");
            Arc::new(MemoryPromotionsRepository::new())
        }
    };

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => EventPublisher::nats(client, config.nats_subject_prefix.clone()),
            Err(error) => {
                tracing::warn!(%error, "NATS unavailable, promotion events disabled");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };
    tracing::info!(enabled = events.is_enabled(), "promotion events");

    let state = AppState::new(Arc::new(Ledger::new(promotions, events)));
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("promotion ledger listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("ctrl_c signal received"),
        () = terminate => tracing::info!("terminate signal received"),
    }
}
