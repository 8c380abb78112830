use axum::{
    extract::{Query, State},
    Json,
};

use super::{ApiError, AppState};
use crate::{
    filter::{DashboardFilter, DashboardQuery},
    store::RecordQuery,
    view_model::DashboardViewModel,
};

/// The whole dashboard for one selection. Derived figures are recomputed on
/// every call.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardViewModel>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "dashboard").increment(1);
    let filter = DashboardFilter::try_from(query)?;

    let records = state
        .store
        .list(RecordQuery {
            year: filter.store_year(),
        })
        .await?;
    tracing::debug!(records = records.len(), label = %filter.label(), "building dashboard");

    Ok(Json(DashboardViewModel::build(filter, &records)))
}
