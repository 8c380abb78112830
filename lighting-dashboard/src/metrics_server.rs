use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid metrics bind address '{0}'")]
    BindAddr(String),
    #[error("failed to install Prometheus recorder: {0}")]
    Recorder(String),
}

/// Install the Prometheus recorder and serve `/metrics` on its own listener.
pub fn init(bind_addr: &str) -> Result<(), MetricsError> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|_| MetricsError::BindAddr(bind_addr.to_string()))?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Recorder(e.to_string()))?;
    // A second init keeps the first handle.
    let _ = PROM_HANDLE.set(handle);

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "metrics listener started");
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });

    Ok(())
}

async fn metrics_handler() -> Result<String, StatusCode> {
    PROM_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}
