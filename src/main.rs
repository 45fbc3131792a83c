mod config;
mod db;
mod rate_limit;
mod routes;
mod services;
mod state;
mod wall;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::otp::LogNotifier;
use crate::services::upload::FsBlobStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `.env` is optional; real environment variables win.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let port = config.port;
    let store = Arc::new(FsBlobStore::new(config.upload_dir.clone()));
    let state = state::AppState::new(pool, config, store, Arc::new(LogNotifier));

    // Forget throttling keys whose attempts have aged out.
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            tick.tick().await;
            limiter.prune();
        }
    });

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "picture-wall listening");
    axum::serve(listener, app).await?;
    Ok(())
}
