use std::net::SocketAddr;

use anyhow::Result;
use lighting_dashboard::{
    api::{self, AppState},
    auth::TokenAuthenticator,
    config::AppConfig,
    connect_store, metrics_server, observability,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store = connect_store(&cfg.store).await?;
    let state = AppState::new(store, TokenAuthenticator::new(&cfg.auth), cfg.export.clone());
    let app = api::router(state);

    let addr: SocketAddr = cfg
        .http
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "lighting dashboard listening");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
