use super::{rows, ExportError, ExportRequest, COLUMNS};

/// Plain CSV with the spreadsheet's columns. Numbers keep `.` decimals so
/// the file stays machine-readable.
pub fn render(request: &ExportRequest<'_>) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(COLUMNS)?;

    for row in rows(request.records) {
        wtr.write_record([
            row.month.to_string(),
            row.year.to_string(),
            row.consumption_kwh.to_string(),
            row.amount_billed.to_string(),
            row.amount_paid.to_string(),
            row.flag.to_string(),
            row.flag_amount.to_string(),
            row.notes,
        ])?;
    }

    wtr.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))
}
