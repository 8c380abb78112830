use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lighting_client::StoreError;

use crate::{auth::AuthError, export::ExportError, filter::FilterError, transform::ValidationError};

pub const DUPLICATE_PERIOD_MESSAGE: &str = "Já existe um registro para este mês/ano.";
const NOT_FOUND_MESSAGE: &str = "Registro não encontrado.";
const INTERNAL_MESSAGE: &str = "Erro interno. Tente novamente mais tarde.";

/// Every failure an HTTP handler can return. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::DuplicatePeriod { .. }) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Filter(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the user. Internal failures get a generic text.
    pub fn message(&self) -> String {
        match self {
            ApiError::Store(StoreError::DuplicatePeriod { .. }) => DUPLICATE_PERIOD_MESSAGE.to_string(),
            ApiError::Store(StoreError::NotFound(_)) => NOT_FOUND_MESSAGE.to_string(),
            ApiError::Auth(AuthError::InvalidCredentials) => "Credenciais inválidas.".to_string(),
            e if e.status().is_server_error() => INTERNAL_MESSAGE.to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request refused");
        }
        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string()).increment(1);

        (status, Json(serde_json::json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lighting_client::domain::BillingPeriod;

    #[test]
    fn maps_errors_to_statuses_and_messages() {
        let dup = ApiError::from(StoreError::DuplicatePeriod { year: 2024, month: 1 });
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        assert_eq!(dup.message(), DUPLICATE_PERIOD_MESSAGE);

        let forbidden = ApiError::from(AuthError::Forbidden);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.message(), "Acesso negado");

        let invalid = ApiError::from(ValidationError::Month(13));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.message(), "O mês deve estar entre 1 e 12.");

        let filter = ApiError::from(FilterError::InvertedRange {
            start: BillingPeriod::new(2024, 5),
            end: BillingPeriod::new(2024, 1),
        });
        assert_eq!(filter.status(), StatusCode::BAD_REQUEST);

        let corrupt = ApiError::from(StoreError::Corrupt("month 0".into()));
        assert_eq!(corrupt.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!corrupt.message().contains("month 0"));
    }

    #[test]
    fn renders_a_json_body() {
        let response = ApiError::from(StoreError::NotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
