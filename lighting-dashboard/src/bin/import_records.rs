use anyhow::{bail, Result};
use lighting_client::domain::RecordDraft;
use lighting_dashboard::{
    config::AppConfig,
    connect_store, observability,
    pipeline::{Pipeline, Source},
    sinks::StoreSink,
    sources::{RecordCsvFileSource, RecordNdjsonFileSource},
    transform::DraftValidation,
};
use std::{env, path::Path, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: import_records <file.csv|file.ndjson>");
    }
    let file_path = Path::new(&args[1]);
    if !file_path.is_file() {
        bail!("input file '{}' does not exist", file_path.display());
    }

    let cfg = AppConfig::load()?;
    let store = connect_store(&cfg.store).await?;

    let sink = StoreSink::new(
        store,
        cfg.import.overwrite,
        cfg.import.max_retries,
        Duration::from_millis(cfg.import.retry_backoff_ms),
    );

    let is_csv = file_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    let report = if is_csv {
        run(RecordCsvFileSource::new(file_path), sink).await?
    } else {
        run(RecordNdjsonFileSource::new(file_path), sink).await?
    };

    tracing::info!(
        created = report.created,
        overwritten = report.overwritten,
        skipped = report.skipped,
        rejected = report.rejected,
        "import finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn run<S>(source: S, sink: StoreSink) -> Result<lighting_dashboard::sinks::ImportReport>
where
    S: Source<RecordDraft> + 'static,
{
    let pipeline: Pipeline<_, RecordDraft, _> = Pipeline {
        source,
        transforms: vec![Arc::new(DraftValidation)],
        sink,
    };
    Ok(pipeline.run().await?)
}
