//! Record persistence behind a trait, so the HTTP layer and the import
//! pipeline work the same against Postgres and the in-memory store.

pub mod memory;
pub mod postgres;

use lighting_client::{
    domain::{MonthlyEnergyRecord, RecordDraft},
    StoreError,
};
use time::OffsetDateTime;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordQuery {
    pub year: Option<i32>,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self { year: Some(year) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Role names the store does not know are ignored.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Records ascending by billing period.
    async fn list(&self, query: RecordQuery) -> Result<Vec<MonthlyEnergyRecord>, StoreError>;

    async fn latest(&self) -> Result<Option<MonthlyEnergyRecord>, StoreError>;

    /// Distinct years with records, newest first; the current year when empty.
    async fn available_years(&self) -> Result<Vec<i32>, StoreError>;

    async fn create(&self, draft: RecordDraft) -> Result<MonthlyEnergyRecord, StoreError>;

    async fn update(&self, id: &str, draft: RecordDraft) -> Result<MonthlyEnergyRecord, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>, StoreError>;
}

pub(crate) fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

/// Apply the empty-store fallback shared by every backend.
pub(crate) fn years_or_current(years: Vec<i32>) -> Vec<i32> {
    if years.is_empty() {
        vec![current_year()]
    } else {
        years
    }
}
