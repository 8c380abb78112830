/// Failures of the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a record already exists for {month:02}/{year}")]
    DuplicatePeriod { year: i32, month: u32 },
    #[error("record '{0}' not found")]
    NotFound(String),
    #[error("stored record is unreadable: {0}")]
    Corrupt(String),
    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),
}
