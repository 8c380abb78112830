use anyhow::{bail, Result};
use lighting_dashboard::{
    config::AppConfig,
    connect_store,
    export::{export, ExportFormat, ExportRequest},
    filter::DashboardFilter,
    observability,
    store::RecordQuery,
};
use std::env;
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: export_records <xlsx|csv|pdf> <output_path> [year]");
    }
    let format: ExportFormat = args[1].parse().map_err(anyhow::Error::msg)?;
    let out_path = &args[2];
    let filter = match args.get(3) {
        Some(year) => DashboardFilter::for_year(year.parse()?),
        None => DashboardFilter::default(),
    };

    let cfg = AppConfig::load()?;
    let store = connect_store(&cfg.store).await?;

    let all = store.list(RecordQuery { year: filter.store_year() }).await?;
    let records = filter.apply(&all);

    let file = export(
        format,
        &ExportRequest {
            records: &records,
            label: filter.label(),
            slug: filter.slug(),
            generated_on: OffsetDateTime::now_utc().date(),
            rows_per_page: cfg.export.rows_per_page,
        },
    )?;
    tokio::fs::write(out_path, &file.bytes).await?;

    tracing::info!(path = %out_path, records = records.len(), bytes = file.bytes.len(), "export written");
    Ok(())
}
