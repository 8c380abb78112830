use lighting_client::{
    db::{energy_record_queries as records, role_queries},
    domain::{MonthlyEnergyRecord, RecordDraft},
    StoreError,
};
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{years_or_current, RecordQuery, RecordStore, Role};

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(uri)
            .await?;
        Ok(Self::new(pool))
    }
}

fn observe<T>(op: &'static str, res: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Err(StoreError::Backend(e)) = &res {
        tracing::error!(error = %e, op, "record store backend error");
        metrics::counter!("store_backend_errors_total", "op" => op).increment(1);
    }
    res
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn list(&self, query: RecordQuery) -> Result<Vec<MonthlyEnergyRecord>, StoreError> {
        observe("list", records::list_records(&self.pool, query.year).await)
    }

    async fn latest(&self) -> Result<Option<MonthlyEnergyRecord>, StoreError> {
        observe("latest", records::latest_record(&self.pool).await)
    }

    async fn available_years(&self) -> Result<Vec<i32>, StoreError> {
        observe("available_years", records::available_years(&self.pool).await).map(years_or_current)
    }

    async fn create(&self, draft: RecordDraft) -> Result<MonthlyEnergyRecord, StoreError> {
        observe("create", records::insert_record(&self.pool, &draft).await)
    }

    async fn update(&self, id: &str, draft: RecordDraft) -> Result<MonthlyEnergyRecord, StoreError> {
        observe("update", records::update_record(&self.pool, id, &draft).await)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        observe("delete", records::delete_record(&self.pool, id).await)
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>, StoreError> {
        let names = observe("roles_for_user", role_queries::roles_for_user(&self.pool, user_id).await)?;
        Ok(names.iter().filter_map(|n| Role::parse(n)).collect())
    }
}
