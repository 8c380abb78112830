use rust_xlsxwriter::{Format, Workbook};

use super::{rows, ExportError, ExportRequest, COLUMNS};

const MAX_SHEET_NAME_CHARS: usize = 31;
const MIN_COLUMN_WIDTH: usize = 10;

/// `Consumo <label>`, with the characters Excel forbids in sheet names
/// replaced and the result cut to 31 characters.
pub fn sheet_name(label: &str) -> String {
    format!("Consumo {label}")
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '-',
            c => c,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

pub fn render(request: &ExportRequest<'_>) -> Result<Vec<u8>, ExportError> {
    let rows = rows(request.records);
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.chars().count().max(MIN_COLUMN_WIDTH)).collect();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name(sheet_name(&request.label))?;
    let bold = Format::new().set_bold();

    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, row.month)?;
        sheet.write_number(r, 1, row.year as f64)?;
        sheet.write_number(r, 2, row.consumption_kwh)?;
        sheet.write_number(r, 3, row.amount_billed)?;
        sheet.write_number(r, 4, row.amount_paid)?;
        sheet.write_string(r, 5, row.flag)?;
        sheet.write_number(r, 6, row.flag_amount)?;
        sheet.write_string(r, 7, &row.notes)?;

        let cells = [
            row.month.chars().count(),
            row.year.to_string().len(),
            row.consumption_kwh.to_string().len(),
            row.amount_billed.to_string().len(),
            row.amount_paid.to_string().len(),
            row.flag.chars().count(),
            row.flag_amount.to_string().len(),
            row.notes.chars().count(),
        ];
        for (w, len) in widths.iter_mut().zip(cells) {
            *w = (*w).max(len);
        }
    }

    for (col, width) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, (*width + 2) as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}
