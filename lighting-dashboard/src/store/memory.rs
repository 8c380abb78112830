use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
};

use lighting_client::{
    domain::{MonthlyEnergyRecord, RecordDraft},
    StoreError,
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{years_or_current, RecordQuery, RecordStore, Role};

/// In-process store with the same uniqueness rules as the `energy_records`
/// table. Used by tests and by the `memory` store kind.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<MonthlyEnergyRecord>>,
    roles: RwLock<HashMap<String, HashSet<Role>>>,
    next_id: AtomicU64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = MonthlyEnergyRecord>) -> Self {
        let mut records: Vec<_> = records.into_iter().collect();
        records.sort_by_key(|r| r.period);
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, user_id: impl Into<String>, role: Role) -> Self {
        self.roles.get_mut().entry(user_id.into()).or_default().insert(role);
        self
    }

    fn allocate_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

fn period_taken(records: &[MonthlyEnergyRecord], draft: &RecordDraft, except_id: Option<&str>) -> bool {
    records
        .iter()
        .any(|r| r.period == draft.period && Some(r.id.as_str()) != except_id)
}

fn duplicate(draft: &RecordDraft) -> StoreError {
    StoreError::DuplicatePeriod {
        year: draft.period.year,
        month: draft.period.month,
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, query: RecordQuery) -> Result<Vec<MonthlyEnergyRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| query.year.map_or(true, |y| r.period.year == y))
            .cloned()
            .collect())
    }

    async fn latest(&self) -> Result<Option<MonthlyEnergyRecord>, StoreError> {
        Ok(self.records.read().await.last().cloned())
    }

    async fn available_years(&self) -> Result<Vec<i32>, StoreError> {
        let records = self.records.read().await;
        let mut years: Vec<i32> = records.iter().map(|r| r.period.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years_or_current(years))
    }

    async fn create(&self, draft: RecordDraft) -> Result<MonthlyEnergyRecord, StoreError> {
        let mut records = self.records.write().await;
        if period_taken(&records, &draft, None) {
            return Err(duplicate(&draft));
        }

        let record = draft.into_record(self.allocate_id(), Some(OffsetDateTime::now_utc()));
        let at = records.partition_point(|r| r.period < record.period);
        records.insert(at, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, draft: RecordDraft) -> Result<MonthlyEnergyRecord, StoreError> {
        let mut records = self.records.write().await;
        let idx = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if period_taken(&records, &draft, Some(id)) {
            return Err(duplicate(&draft));
        }

        records.remove(idx);
        let record = draft.into_record(id.to_string(), Some(OffsetDateTime::now_utc()));
        let at = records.partition_point(|r| r.period < record.period);
        records.insert(at, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>, StoreError> {
        let roles = self.roles.read().await;
        Ok(roles
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}
