use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use super::{records::filtered_records, ApiError, AppState};
use crate::{
    export::{export, ExportFormat, ExportRequest},
    filter::{DashboardFilter, DashboardQuery},
};

/// `GET /api/export/{xlsx,csv,pdf}` with the dashboard's filter query.
pub async fn download(
    State(state): State<AppState>,
    Path(format): Path<ExportFormat>,
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    metrics::counter!("http_requests_total", "route" => "export").increment(1);
    let filter = DashboardFilter::try_from(query)?;
    let records = filtered_records(&state, &filter).await?;

    let file = export(
        format,
        &ExportRequest {
            records: &records,
            label: filter.label(),
            slug: filter.slug(),
            generated_on: OffsetDateTime::now_utc().date(),
            rows_per_page: state.export.rows_per_page,
        },
    )?;
    let etag = file.etag();

    if headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag)
    {
        return Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response());
    }

    tracing::info!(file = %file.file_name, records = records.len(), "export generated");
    Ok((
        [
            (CONTENT_TYPE, file.content_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.file_name)),
            (ETAG, etag),
        ],
        file.bytes,
    )
        .into_response())
}
