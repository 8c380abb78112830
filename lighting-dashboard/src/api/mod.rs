//! HTTP surface: public read routes and the admin CRUD routes.

pub mod dashboard;
pub mod error;
pub mod export;
pub mod records;

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};

pub use error::ApiError;

use crate::{
    auth::{Session, TokenAuthenticator},
    config::ExportConfig,
    store::RecordStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<TokenAuthenticator>,
    pub export: ExportConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, auth: TokenAuthenticator, export: ExportConfig) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
            export,
        }
    }

    pub(crate) async fn session(&self, headers: &HeaderMap) -> Result<Session, ApiError> {
        Ok(self.auth.session(headers, self.store.as_ref()).await?)
    }

    /// The caller's session, provided it holds the admin role.
    pub(crate) async fn admin(&self, headers: &HeaderMap) -> Result<Session, ApiError> {
        let session = self.session(headers).await?;
        session.require_admin()?;
        Ok(session)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/session", get(session))
        .route("/api/years", get(records::years))
        .route("/api/records", get(records::list))
        .route("/api/records/latest", get(records::latest))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/export/:format", get(export::download))
        .route("/api/admin/records", post(records::create))
        .route("/api/admin/records/:id", put(records::update).delete(records::delete))
        .with_state(state)
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.session(&headers).await?))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
    use lighting_client::domain::MonthlyEnergyRecord;

    use super::AppState;
    use crate::{
        auth::TokenAuthenticator,
        config::{AuthConfig, ExportConfig, TokenConfig},
        store::{MemoryRecordStore, Role},
    };

    pub const ADMIN_TOKEN: &str = "admin-token";
    pub const READER_TOKEN: &str = "reader-token";

    pub fn state(records: Vec<MonthlyEnergyRecord>) -> AppState {
        let store = MemoryRecordStore::with_records(records).with_role("ana", Role::Admin);
        let auth = TokenAuthenticator::new(&AuthConfig {
            tokens: vec![
                TokenConfig {
                    token: ADMIN_TOKEN.into(),
                    user_id: "ana".into(),
                },
                TokenConfig {
                    token: READER_TOKEN.into(),
                    user_id: "bruno".into(),
                },
            ],
        });
        AppState::new(Arc::new(store), auth, ExportConfig::default())
    }

    pub fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::{test_support::*, *};

    #[tokio::test]
    async fn session_reports_admin_status() {
        let state = state(Vec::new());

        let Json(admin) = session(State(state.clone()), bearer(ADMIN_TOKEN)).await.unwrap();
        assert!(admin.authenticated && admin.is_admin);

        let Json(anon) = session(State(state.clone()), HeaderMap::new()).await.unwrap();
        assert!(!anon.authenticated);

        let err = session(State(state), bearer("bogus")).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn router_builds() {
        let _app = router(state(Vec::new()));
    }
}
