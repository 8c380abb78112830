//! Bearer-token sessions and the admin gate.

use std::collections::HashMap;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use lighting_client::StoreError;
use serde::Serialize;

use crate::{
    config::AuthConfig,
    store::{RecordStore, Role},
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credenciais inválidas")]
    InvalidCredentials,
    #[error("Acesso negado")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Who is calling. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub is_admin: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        match (self.authenticated, self.is_admin) {
            (false, _) => Err(AuthError::InvalidCredentials),
            (true, false) => Err(AuthError::Forbidden),
            (true, true) => Ok(()),
        }
    }
}

/// Token → user id table loaded from config.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    users_by_token: HashMap<String, String>,
}

impl TokenAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            users_by_token: config
                .tokens
                .iter()
                .map(|t| (t.token.clone(), t.user_id.clone()))
                .collect(),
        }
    }

    /// No `Authorization` header is an anonymous session; a header with an
    /// unknown or malformed token is an error.
    pub async fn session(&self, headers: &HeaderMap, store: &dyn RecordStore) -> Result<Session, AuthError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Session::anonymous());
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AuthError::InvalidCredentials)?;

        let user_id = self
            .users_by_token
            .get(token)
            .ok_or(AuthError::InvalidCredentials)?;

        let roles = store.roles_for_user(user_id).await?;
        Ok(Session {
            authenticated: true,
            user_id: Some(user_id.clone()),
            is_admin: roles.contains(&Role::Admin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::TokenConfig, store::MemoryRecordStore};
    use axum::http::HeaderValue;

    fn authenticator() -> TokenAuthenticator {
        TokenAuthenticator::new(&AuthConfig {
            tokens: vec![
                TokenConfig {
                    token: "admin-token".into(),
                    user_id: "ana".into(),
                },
                TokenConfig {
                    token: "reader-token".into(),
                    user_id: "bruno".into(),
                },
            ],
        })
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        headers
    }

    #[tokio::test]
    async fn resolves_sessions_from_tokens() {
        let store = MemoryRecordStore::new().with_role("ana", Role::Admin);
        let auth = authenticator();

        let admin = auth.session(&bearer("admin-token"), &store).await.unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.user_id.as_deref(), Some("ana"));
        assert!(admin.require_admin().is_ok());

        let reader = auth.session(&bearer("reader-token"), &store).await.unwrap();
        assert!(reader.authenticated);
        assert!(matches!(reader.require_admin(), Err(AuthError::Forbidden)));

        let anon = auth.session(&HeaderMap::new(), &store).await.unwrap();
        assert_eq!(anon, Session::anonymous());
        assert!(matches!(anon.require_admin(), Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_or_malformed_tokens_are_rejected() {
        let store = MemoryRecordStore::new();
        let auth = authenticator();
        assert!(matches!(
            auth.session(&bearer("nope"), &store).await,
            Err(AuthError::InvalidCredentials)
        ));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWRtaW46YWRtaW4="));
        assert!(matches!(auth.session(&basic, &store).await, Err(AuthError::InvalidCredentials)));
    }
}
