use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use lighting_client::{
    domain::{MonthlyEnergyRecord, RecordDraft},
    StoreError,
};
use serde::Serialize;

use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    store::{RecordQuery, RecordStore},
};

/// What happened to each imported month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub overwritten: usize,
    /// Months that already existed and were left untouched.
    pub skipped: usize,
    /// Rows the source or validation refused.
    pub rejected: usize,
}

enum Outcome {
    Created,
    Overwritten,
    Skipped,
}

/// Writes drafts into a [`RecordStore`] one month at a time.
pub struct StoreSink {
    store: Arc<dyn RecordStore>,
    overwrite: bool,
    max_retries: u32,
    retry_backoff: Duration,
}

impl StoreSink {
    pub fn new(store: Arc<dyn RecordStore>, overwrite: bool, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            store,
            overwrite,
            max_retries,
            retry_backoff,
        }
    }

    async fn existing(&self, draft: &RecordDraft) -> Result<Option<MonthlyEnergyRecord>, StoreError> {
        let same_year = self.store.list(RecordQuery::year(draft.period.year)).await?;
        Ok(same_year.into_iter().find(|r| r.period == draft.period))
    }

    async fn write_once(&self, draft: &RecordDraft) -> Result<Outcome, StoreError> {
        match self.store.create(draft.clone()).await {
            Ok(_) => Ok(Outcome::Created),
            Err(StoreError::DuplicatePeriod { .. }) if self.overwrite => match self.existing(draft).await? {
                Some(current) => {
                    self.store.update(&current.id, draft.clone()).await?;
                    Ok(Outcome::Overwritten)
                }
                // Deleted in between; try again as a fresh insert.
                None => self.store.create(draft.clone()).await.map(|_| Outcome::Created),
            },
            Err(StoreError::DuplicatePeriod { .. }) => Ok(Outcome::Skipped),
            Err(e) => Err(e),
        }
    }

    /// Backend failures are retried with linear backoff; anything else is final.
    async fn write(&self, env: &Envelope<RecordDraft>) -> Result<Outcome, StoreError> {
        let mut attempt: u32 = 0;
        loop {
            match self.write_once(&env.payload).await {
                Err(StoreError::Backend(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        period = %env.payload.period,
                        "store write failed, retrying with backoff"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait::async_trait]
impl Sink<RecordDraft> for StoreSink {
    type Output = ImportReport;

    async fn run<S>(&self, mut input: S) -> Result<ImportReport, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<RecordDraft>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut report = ImportReport::default();

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::warn!(error = %e, "import row rejected");
                    report.rejected += 1;
                    continue;
                }
            };

            match self.write(&env).await {
                Ok(Outcome::Created) => report.created += 1,
                Ok(Outcome::Overwritten) => report.overwritten += 1,
                Ok(Outcome::Skipped) => {
                    tracing::info!(period = %env.payload.period, "month already recorded, skipping");
                    report.skipped += 1;
                }
                Err(e @ StoreError::Backend(_)) => {
                    tracing::error!(error = %e, "store sink write failed, giving up");
                    metrics::counter!("import_sink_errors_total").increment(1);
                    return Err(PipelineError::Sink(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, period = %env.payload.period, "import row rejected by store");
                    report.rejected += 1;
                }
            }
        }

        metrics::counter!("import_records_created_total").increment(report.created as u64);
        metrics::counter!("import_records_overwritten_total").increment(report.overwritten as u64);
        metrics::counter!("import_records_skipped_total").increment(report.skipped as u64);
        metrics::counter!("import_records_rejected_total").increment(report.rejected as u64);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pipeline::Pipeline, store::MemoryRecordStore, transform::DraftValidation};
    use lighting_client::domain::BillingPeriod;

    fn draft(month: u32, kwh: f64) -> RecordDraft {
        RecordDraft {
            period: BillingPeriod::new(2024, month),
            consumption_kwh: kwh,
            amount_billed: 10.0,
            amount_paid: 10.0,
            ..RecordDraft::default()
        }
    }

    fn items(drafts: Vec<RecordDraft>) -> futures::stream::Iter<std::vec::IntoIter<Result<Envelope<RecordDraft>, PipelineError>>> {
        futures::stream::iter(drafts.into_iter().map(|d| Ok(Envelope::now(d))).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn existing_months_are_skipped_by_default() {
        let store = Arc::new(MemoryRecordStore::new());
        store.create(draft(1, 1.0)).await.unwrap();

        let sink = StoreSink::new(store.clone(), false, 0, Duration::ZERO);
        let report = sink.run(items(vec![draft(1, 99.0), draft(2, 2.0)])).await.unwrap();

        assert_eq!(report, ImportReport { created: 1, skipped: 1, ..ImportReport::default() });
        let jan = &store.list(RecordQuery::year(2024)).await.unwrap()[0];
        assert_eq!(jan.consumption_kwh, 1.0);
    }

    #[tokio::test]
    async fn overwrite_updates_in_place() {
        let store = Arc::new(MemoryRecordStore::new());
        let first = store.create(draft(1, 1.0)).await.unwrap();

        let sink = StoreSink::new(store.clone(), true, 0, Duration::ZERO);
        let report = sink.run(items(vec![draft(1, 99.0)])).await.unwrap();

        assert_eq!(report.overwritten, 1);
        let jan = &store.list(RecordQuery::all()).await.unwrap()[0];
        assert_eq!(jan.id, first.id);
        assert_eq!(jan.consumption_kwh, 99.0);
    }

    #[tokio::test]
    async fn invalid_drafts_are_counted_not_written() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut bad = draft(2, 1.0);
        bad.amount_paid = -5.0;

        let pipeline: Pipeline<_, RecordDraft, _> = Pipeline {
            source: VecSource(vec![draft(1, 1.0), bad]),
            transforms: vec![Arc::new(DraftValidation)],
            sink: StoreSink::new(store.clone(), false, 0, Duration::ZERO),
        };
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(store.list(RecordQuery::all()).await.unwrap().len(), 1);
    }

    struct VecSource(Vec<RecordDraft>);

    #[async_trait::async_trait]
    impl crate::pipeline::Source<RecordDraft> for VecSource {
        async fn stream(&self) -> crate::pipeline::EnvelopeStream<RecordDraft> {
            Box::pin(items(self.0.clone()))
        }
    }
}
