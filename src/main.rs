//! Storefront - session cart, discount and checkout service

use std::sync::Arc;

use anyhow::Result;
use storefront::api::{router, AppState};
use storefront::backend::http::HttpBackend;
use storefront::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let backend = Arc::new(HttpBackend::new(&config.backend_url, config.request_timeout)?);
    let state = AppState::new(config.data_dir.clone(), backend.clone(), backend);
    let app = router(state);

    tracing::info!("storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?,
        app,
    )
    .await?;
    Ok(())
}
