//! Rental inventory API server.
//!
//! Run from repo root: `cargo run -p rental-server`

use rental_inventory::{app, ensure_database_exists, ensure_schema, AppConfig, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rental_inventory=info,rental_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(environment = ?config.environment, port = config.api_port, "starting");

    ensure_database_exists(&config.database.connect_options()?).await?;
    let pool = config.database.connect().await?;
    ensure_schema(&pool).await?;

    let router = app(AppState::new(pool), &config);
    let listener = TcpListener::bind(("0.0.0.0", config.api_port)).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
