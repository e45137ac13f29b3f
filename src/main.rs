use std::{sync::Arc, time::Duration};

use anyhow::Context;
use points_rewards_service::{
    adapters::database::mysql::MySqlDatabase, commands::DomainLogic, config::Config, http,
};
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "points_rewards_service=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("failed to connect to MySQL")?;
    info!(table_prefix = %config.table_prefix, "connected to MySQL");

    // The WordPress users table doubles as the user directory
    let database = Arc::new(MySqlDatabase::new(pool, &config.table_prefix));
    let app = http::router(DomainLogic::new(database.clone(), database));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "points API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("points API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
