use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use lighting_client::domain::{MonthlyEnergyRecord, RecordDraft};

use super::{ApiError, AppState};
use crate::{
    filter::{DashboardFilter, DashboardQuery},
    store::RecordQuery,
    transform::validate_draft,
};

/// Selected records for a filter, oldest first.
pub(crate) async fn filtered_records(
    state: &AppState,
    filter: &DashboardFilter,
) -> Result<Vec<MonthlyEnergyRecord>, ApiError> {
    let records = state
        .store
        .list(RecordQuery {
            year: filter.store_year(),
        })
        .await?;
    Ok(filter.apply(&records))
}

pub async fn years(State(state): State<AppState>) -> Result<Json<Vec<i32>>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "years").increment(1);
    Ok(Json(state.store.available_years().await?))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<MonthlyEnergyRecord>>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "records").increment(1);
    let filter = DashboardFilter::try_from(query)?;
    Ok(Json(filtered_records(&state, &filter).await?))
}

pub async fn latest(State(state): State<AppState>) -> Result<Json<Option<MonthlyEnergyRecord>>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "records_latest").increment(1);
    Ok(Json(state.store.latest().await?))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<RecordDraft>,
) -> Result<(StatusCode, Json<MonthlyEnergyRecord>), ApiError> {
    metrics::counter!("http_requests_total", "route" => "admin_records").increment(1);
    let session = state.admin(&headers).await?;
    validate_draft(&draft)?;

    let record = state.store.create(draft).await?;
    tracing::info!(id = %record.id, period = %record.period, user = ?session.user_id, "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(draft): Json<RecordDraft>,
) -> Result<Json<MonthlyEnergyRecord>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "admin_records").increment(1);
    let session = state.admin(&headers).await?;
    validate_draft(&draft)?;

    let record = state.store.update(&id, draft).await?;
    tracing::info!(id = %record.id, period = %record.period, user = ?session.user_id, "record updated");
    Ok(Json(record))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    metrics::counter!("http_requests_total", "route" => "admin_records").increment(1);
    let session = state.admin(&headers).await?;

    state.store.delete(&id).await?;
    tracing::info!(%id, user = ?session.user_id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::engine::fixtures::{record, year_2024};
    use lighting_client::domain::BillingPeriod;

    fn draft(month: u32) -> RecordDraft {
        RecordDraft {
            period: BillingPeriod::new(2025, month),
            consumption_kwh: 1000.0,
            amount_billed: 500.0,
            amount_paid: 500.0,
            ..RecordDraft::default()
        }
    }

    #[tokio::test]
    async fn public_reads() {
        let mut records = year_2024();
        records.push(record(2023, 6, 1.0, 1.0));
        let state = state(records);

        let Json(years) = years(State(state.clone())).await.unwrap();
        assert_eq!(years, vec![2024, 2023]);

        let query = DashboardQuery {
            year: Some(2023),
            ..DashboardQuery::default()
        };
        let Json(listed) = list(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(listed.len(), 1);

        let Json(latest) = latest(State(state)).await.unwrap();
        assert_eq!(latest.unwrap().period, BillingPeriod::new(2024, 12));
    }

    #[tokio::test]
    async fn bad_filter_is_a_bad_request() {
        let query = DashboardQuery {
            flag: Some("roxa".into()),
            ..DashboardQuery::default()
        };
        let err = list(State(state(Vec::new())), Query(query)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_crud_round() {
        let state = state(Vec::new());

        let (status, Json(created)) = create(State(state.clone()), bearer(ADMIN_TOKEN), Json(draft(1)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let mut changed = draft(1);
        changed.amount_paid = 450.0;
        let Json(updated) = update(
            State(state.clone()),
            Path(created.id.clone()),
            bearer(ADMIN_TOKEN),
            Json(changed),
        )
        .await
        .unwrap();
        assert_eq!(updated.amount_paid, 450.0);

        let status = delete(State(state.clone()), Path(created.id.clone()), bearer(ADMIN_TOKEN))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete(State(state), Path(created.id), bearer(ADMIN_TOKEN)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_month_is_a_conflict() {
        let state = state(Vec::new());
        create(State(state.clone()), bearer(ADMIN_TOKEN), Json(draft(3))).await.unwrap();

        let err = create(State(state), bearer(ADMIN_TOKEN), Json(draft(3))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "Já existe um registro para este mês/ano.");
    }

    #[tokio::test]
    async fn admin_routes_are_gated() {
        let state = state(Vec::new());

        let err = create(State(state.clone()), HeaderMap::new(), Json(draft(1))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = create(State(state.clone()), bearer(READER_TOKEN), Json(draft(1))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "Acesso negado");

        assert!(state.store.list(RecordQuery::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_drafts_never_reach_the_store() {
        let state = state(Vec::new());
        let mut bad = draft(1);
        bad.notes = Some("x".repeat(1001));

        let err = create(State(state.clone()), bearer(ADMIN_TOKEN), Json(bad)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.store.list(RecordQuery::all()).await.unwrap().is_empty());
    }
}
