use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use lighting_client::domain::{BillingPeriod, LevyFigures, RecordDraft, TariffFlag};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// CSV source of historical bills, one row per month.
///
/// Header columns (by name, same as the `energy_records` table):
/// - year, month
/// - consumption_kwh, amount_billed, amount_paid
/// - tariff_flag (optional code: green, yellow, red_1, red_2)
/// - unit_price_flag, flag_amount_billed (optional)
/// - unit_price_energy, unit_price_distribution (optional)
/// - levy_billed, levy_collected, levy_customer_count (optional)
/// - delinquency_rate, notes (optional)
///
/// Numbers may use either `.` or `,` as the decimal separator.
pub struct RecordCsvFileSource {
    path: PathBuf,
}

impl RecordCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

/// `1.234,56` and `1234,56` become `1234.56`; without a comma the dot is the
/// decimal separator.
fn normalize_number(s: &str) -> String {
    let s = s.trim();
    if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    }
}

fn parse_required<T: std::str::FromStr>(name: &str, s: &str) -> Result<T, PipelineError>
where
    T::Err: std::fmt::Display,
{
    normalize_number(s)
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid {name} '{s}': {e}")))
}

fn parse_optional<T: std::str::FromStr>(name: &str, s: Option<&str>) -> Result<Option<T>, PipelineError>
where
    T::Err: std::fmt::Display,
{
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_required(name, v).map(Some),
    }
}

fn parse_optional_string(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub(crate) fn record_to_draft(record: &StringRecord, headers: &StringRecord) -> Result<RecordDraft, PipelineError> {
    let column = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
    };
    let required = |name: &str| -> Result<&str, PipelineError> {
        column(name).ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let year: i32 = parse_required("year", required("year")?)?;
    let month: u32 = parse_required("month", required("month")?)?;

    let tariff_flag = TariffFlag::from_parts(
        column("tariff_flag").map(str::trim),
        parse_optional("unit_price_flag", column("unit_price_flag"))?,
    )
    .map_err(|e| PipelineError::Source(e.to_string()))?;

    Ok(RecordDraft {
        period: BillingPeriod::new(year, month),
        consumption_kwh: parse_required("consumption_kwh", required("consumption_kwh")?)?,
        amount_billed: parse_required("amount_billed", required("amount_billed")?)?,
        amount_paid: parse_required("amount_paid", required("amount_paid")?)?,
        tariff_flag,
        flag_amount_billed: parse_optional("flag_amount_billed", column("flag_amount_billed"))?,
        unit_price_energy: parse_optional("unit_price_energy", column("unit_price_energy"))?,
        unit_price_distribution: parse_optional("unit_price_distribution", column("unit_price_distribution"))?,
        levy: LevyFigures {
            billed: parse_optional("levy_billed", column("levy_billed"))?,
            collected: parse_optional("levy_collected", column("levy_collected"))?,
            customer_count: parse_optional("levy_customer_count", column("levy_customer_count"))?,
        },
        delinquency_rate: parse_optional("delinquency_rate", column("delinquency_rate"))?,
        notes: parse_optional_string(column("notes")),
    })
}

#[async_trait::async_trait]
impl Source<RecordDraft> for RecordCsvFileSource {
    /// A row that cannot be parsed is yielded as an error and reading goes on;
    /// an unreadable file ends the stream after one error.
    async fn stream(&self) -> EnvelopeStream<RecordDraft> {
        // Bill histories are a few hundred rows, so the blocking reader is fine here.
        let path = self.path.clone();
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to open CSV file: {e}")));
                    return;
                }
            };
            let mut rdr = csv::Reader::from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to read CSV headers: {e}")));
                    return;
                }
            };

            for (line, result) in rdr.records().enumerate() {
                let parsed = result
                    .map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))
                    .and_then(|record| record_to_draft(&record, &headers));

                match parsed {
                    Ok(draft) => yield Ok(Envelope::now(draft)),
                    Err(e) => {
                        metrics::counter!("import_csv_parse_errors_total").increment(1);
                        yield Err(PipelineError::Source(format!("row {}: {e}", line + 2)));
                    }
                }
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use lighting_client::domain::FlagKind;
    use std::io::Write;

    fn row(headers: &[&str], values: &[&str]) -> (StringRecord, StringRecord) {
        (StringRecord::from(values.to_vec()), StringRecord::from(headers.to_vec()))
    }

    #[test]
    fn parses_a_full_row_with_comma_decimals() {
        let (record, headers) = row(
            &["year", "month", "consumption_kwh", "amount_billed", "amount_paid", "tariff_flag", "unit_price_flag", "levy_customer_count", "notes"],
            &["2024", "3", "1234,5", "600", "598.40", "red_1", "0,045", "1200", "  leitura estimada "],
        );
        let draft = record_to_draft(&record, &headers).unwrap();
        assert_eq!(draft.period, BillingPeriod::new(2024, 3));
        assert_eq!(draft.consumption_kwh, 1234.5);
        assert_eq!(draft.amount_paid, 598.40);
        assert_eq!(draft.tariff_flag.kind(), FlagKind::Red1);
        assert_eq!(draft.tariff_flag.extra_unit_price(), 0.045);
        assert_eq!(draft.levy.customer_count, Some(1200));
        assert_eq!(draft.notes.as_deref(), Some("leitura estimada"));
        assert_eq!(draft.unit_price_energy, None);
    }

    #[test]
    fn grouped_thousands_with_decimal_comma() {
        assert_eq!(normalize_number(" 1.234,56 "), "1234.56");
        assert_eq!(normalize_number("12.345.678,9"), "12345678.9");
        assert_eq!(normalize_number("1234.5"), "1234.5");

        let (record, headers) = row(
            &["year", "month", "consumption_kwh", "amount_billed", "amount_paid"],
            &["2024", "5", "45.210,5", "1.234,56", "1.200"],
        );
        let draft = record_to_draft(&record, &headers).unwrap();
        assert_eq!(draft.consumption_kwh, 45210.5);
        assert_eq!(draft.amount_billed, 1234.56);
        assert_eq!(draft.amount_paid, 1.2);
    }

    #[test]
    fn green_rows_drop_the_flag_price() {
        let (record, headers) = row(
            &["year", "month", "consumption_kwh", "amount_billed", "amount_paid", "tariff_flag", "unit_price_flag"],
            &["2024", "1", "10", "5", "5", "", "5"],
        );
        let draft = record_to_draft(&record, &headers).unwrap();
        assert_eq!(draft.tariff_flag, TariffFlag::Green);
    }

    #[test]
    fn missing_required_column_is_a_source_error() {
        let (record, headers) = row(&["year", "month"], &["2024", "1"]);
        let err = record_to_draft(&record, &headers).unwrap_err();
        assert!(matches!(err, PipelineError::Source(msg) if msg.contains("consumption_kwh")));
    }

    #[tokio::test]
    async fn streams_rows_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "year,month,consumption_kwh,amount_billed,amount_paid").unwrap();
        writeln!(file, "2024,1,100,50,50").unwrap();
        writeln!(file, "2024,x,100,50,50").unwrap();
        writeln!(file, "2024,2,100,50,50").unwrap();
        file.flush().unwrap();

        let source = RecordCsvFileSource::new(file.path());
        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(&items[1], Err(PipelineError::Source(msg)) if msg.starts_with("row 3")));
        assert_eq!(items[2].as_ref().unwrap().payload.period, BillingPeriod::new(2024, 2));
    }

    #[tokio::test]
    async fn missing_file_yields_a_single_error() {
        let source = RecordCsvFileSource::new("/nonexistent/contas.csv");
        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
