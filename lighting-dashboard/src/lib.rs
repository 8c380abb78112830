pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod export;
pub mod filter;
pub mod format;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod store;
pub mod transform;
pub mod view_model;

pub use pipeline::{Envelope, Pipeline};

use std::sync::Arc;

use config::{StoreConfig, StoreKind};
use store::{MemoryRecordStore, PgRecordStore, RecordStore, Role};

/// Open the store the config asks for.
pub async fn connect_store(cfg: &StoreConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match cfg.kind {
        StoreKind::Postgres => {
            let uri = cfg
                .uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("store.uri is required for the postgres store"))?;
            let store = PgRecordStore::connect(uri, cfg.max_connections).await?;
            tracing::info!(max_connections = cfg.max_connections, "connected to postgres record store");
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            let store = cfg
                .memory_admin_user_ids
                .iter()
                .fold(MemoryRecordStore::new(), |s, user| s.with_role(user.clone(), Role::Admin));
            tracing::warn!("using in-memory record store; data is lost on exit");
            Ok(Arc::new(store))
        }
    }
}
