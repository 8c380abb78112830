//! Downloadable exports of the selected records: spreadsheet, CSV and a
//! paginated PDF report.

pub mod delimited;
pub mod pdf;
pub mod xlsx;

use std::str::FromStr;

use lighting_client::domain::{month_name, MonthlyEnergyRecord};
use serde::Deserialize;
use time::Date;

pub const FILE_PREFIX: &str = "iluminacao-publica";

/// Column titles shared by the spreadsheet and CSV exports.
pub const COLUMNS: [&str; 8] = [
    "Mês",
    "Ano",
    "Consumo (kWh)",
    "Valor Faturado (R$)",
    "Valor Pago (R$)",
    "Bandeira",
    "Valor Bandeira (R$)",
    "Observações",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("spreadsheet encoding failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("pdf encoding failed: {0}")]
    Pdf(String),
    #[error("failed to finish export buffer: {0}")]
    Buffer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format '{other}' (expected xlsx, csv or pdf)")),
        }
    }
}

/// What is being exported and how it is titled.
#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    pub records: &'a [MonthlyEnergyRecord],
    /// Human label of the selection, e.g. `2024` or `Jan/2024 - Mar/2024`.
    pub label: String,
    /// File-name form of the label.
    pub slug: String,
    pub generated_on: Date,
    pub rows_per_page: usize,
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Strong validator over the body.
    pub fn etag(&self) -> String {
        format!("\"{}\"", blake3::hash(&self.bytes).to_hex())
    }
}

/// One spreadsheet/CSV row, in [`COLUMNS`] order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExportRow {
    pub month: &'static str,
    pub year: i32,
    pub consumption_kwh: f64,
    pub amount_billed: f64,
    pub amount_paid: f64,
    pub flag: &'static str,
    pub flag_amount: f64,
    pub notes: String,
}

impl ExportRow {
    pub fn of(r: &MonthlyEnergyRecord) -> Self {
        Self {
            month: month_name(r.period.month),
            year: r.period.year,
            consumption_kwh: r.consumption_kwh,
            amount_billed: r.amount_billed,
            amount_paid: r.amount_paid,
            flag: r.tariff_flag.kind().display_name(),
            flag_amount: r.flag_amount_billed.unwrap_or(0.0),
            notes: r.notes.clone().unwrap_or_default(),
        }
    }
}

/// Rows in chronological order.
pub(crate) fn rows(records: &[MonthlyEnergyRecord]) -> Vec<ExportRow> {
    let mut sorted: Vec<&MonthlyEnergyRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.period);
    sorted.into_iter().map(ExportRow::of).collect()
}

pub fn export(format: ExportFormat, request: &ExportRequest<'_>) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Xlsx => xlsx::render(request)?,
        ExportFormat::Csv => delimited::render(request)?,
        ExportFormat::Pdf => pdf::render(request)?,
    };
    metrics::counter!("exports_total", "format" => format.extension()).increment(1);

    Ok(ExportFile {
        file_name: format!("{FILE_PREFIX}-{}.{}", request.slug, format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lighting_client::domain::{BillingPeriod, FlagKind, LevyFigures, MonthlyEnergyRecord, TariffFlag};
    use time::macros::date;

    use super::ExportRequest;

    pub fn record(month: u32, kwh: f64, paid: f64) -> MonthlyEnergyRecord {
        MonthlyEnergyRecord {
            id: format!("r{month}"),
            period: BillingPeriod::new(2024, month),
            consumption_kwh: kwh,
            amount_billed: paid + 10.0,
            amount_paid: paid,
            tariff_flag: TariffFlag::Green,
            flag_amount_billed: None,
            unit_price_energy: None,
            unit_price_distribution: None,
            levy: LevyFigures::default(),
            delinquency_rate: None,
            notes: None,
            updated_at: None,
        }
    }

    pub fn records() -> Vec<MonthlyEnergyRecord> {
        let mut feb = record(2, 12_500.0, 6_400.5);
        feb.tariff_flag = TariffFlag::with_kind(FlagKind::Yellow, 0.0188);
        feb.flag_amount_billed = Some(235.0);
        feb.notes = Some("Leitura estimada".into());
        vec![feb, record(1, 12_000.0, 6_000.0)]
    }

    pub fn request(records: &[MonthlyEnergyRecord]) -> ExportRequest<'_> {
        ExportRequest {
            records,
            label: "2024".into(),
            slug: "2024".into(),
            generated_on: date!(2024 - 03 - 05),
            rows_per_page: 40,
        }
    }
}
