//! Printable PDF report: A4 landscape pages in a fixed-width font, the title
//! block on the first page, the column header on every page, the TOTAL row
//! last and "Página i de n" at the foot of each page.

use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, Stream, StringFormat,
};
use time::Date;

use super::{rows, ExportError, ExportRequest, ExportRow};
use crate::format;

pub const TITLE: &str = "Relatório de Iluminação Pública";
/// More rows than this do not fit under the title block.
pub const MAX_ROWS_PER_PAGE: usize = 40;

const PAGE_WIDTH: i64 = 842;
const PAGE_HEIGHT: i64 = 595;
const MARGIN: i64 = 36;
const FONT_SIZE: i64 = 8;
const TITLE_SIZE: i64 = 12;
const LEADING: i64 = 10;
const RULE_WIDTH: usize = 94;

const HEADER: [&str; 6] = ["Mês", "Consumo (kWh)", "Faturado", "Pago", "Bandeira", "Valor Bandeira"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    Title,
    Bold,
    Body,
}

impl Style {
    fn font(self) -> (&'static str, i64) {
        match self {
            Style::Title => ("F2", TITLE_SIZE),
            Style::Bold => ("F2", FONT_SIZE),
            Style::Body => ("F1", FONT_SIZE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    pub style: Style,
    pub text: String,
}

impl Line {
    fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Page {
    pub lines: Vec<Line>,
    pub footer: String,
}

fn pt_br_date(d: Date) -> String {
    format!("{:02}/{:02}/{}", d.day(), u8::from(d.month()), d.year())
}

fn columns<S: AsRef<str>>(cells: &[S; 6]) -> String {
    format!(
        "{:<12} {:>15} {:>16} {:>16}  {:<12} {:>16}",
        cells[0].as_ref(),
        cells[1].as_ref(),
        cells[2].as_ref(),
        cells[3].as_ref(),
        cells[4].as_ref(),
        cells[5].as_ref()
    )
}

fn body_cells(row: &ExportRow) -> [String; 6] {
    [
        row.month.to_string(),
        format::number(row.consumption_kwh),
        format::currency(row.amount_billed),
        format::currency(row.amount_paid),
        row.flag.to_string(),
        format::currency(row.flag_amount),
    ]
}

fn total_cells(rows: &[ExportRow]) -> [String; 6] {
    let sum = |f: fn(&ExportRow) -> f64| rows.iter().map(f).sum::<f64>();
    [
        "TOTAL".to_string(),
        format::number(sum(|r| r.consumption_kwh)),
        format::currency(sum(|r| r.amount_billed)),
        format::currency(sum(|r| r.amount_paid)),
        "-".to_string(),
        format::currency(sum(|r| r.flag_amount)),
    ]
}

/// Lay the selection out in pages of at most `rows_per_page` table rows.
pub(crate) fn paginate(request: &ExportRequest<'_>) -> Vec<Page> {
    let rows = rows(request.records);
    let mut body: Vec<Line> = rows.iter().map(|r| Line::new(Style::Body, columns(&body_cells(r)))).collect();
    body.push(Line::new(Style::Bold, columns(&total_cells(&rows))));

    let per_page = request.rows_per_page.clamp(1, MAX_ROWS_PER_PAGE);
    let chunks: Vec<&[Line]> = body.chunks(per_page).collect();
    let page_count = chunks.len();

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut lines = Vec::with_capacity(chunk.len() + 6);
            if i == 0 {
                lines.push(Line::new(Style::Title, TITLE));
                lines.push(Line::new(Style::Body, format!("Período: {}", request.label)));
                lines.push(Line::new(Style::Body, format!("Gerado em: {}", pt_br_date(request.generated_on))));
                lines.push(Line::new(Style::Body, ""));
            }
            lines.push(Line::new(Style::Bold, columns(&HEADER)));
            lines.push(Line::new(Style::Body, "-".repeat(RULE_WIDTH)));
            lines.extend(chunk.iter().cloned());
            Page {
                lines,
                footer: format!("Página {} de {}", i + 1, page_count),
            }
        })
        .collect()
}

/// The standard fonts use WinAnsiEncoding, which matches Latin-1 for every
/// accented letter of Portuguese. Anything outside it prints as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if b < 0x80 || b >= 0xA0 => b,
            _ => b'?',
        })
        .collect()
}

fn text_at(ops: &mut Vec<Operation>, style: Style, x: i64, y: i64, text: &str) {
    let (font, size) = style.font();
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]));
    ops.push(Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]));
    ops.push(Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]));
    ops.push(Operation::new("ET", vec![]));
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN - TITLE_SIZE;
    for line in &page.lines {
        if !line.text.is_empty() {
            text_at(&mut operations, line.style, MARGIN, y, &line.text);
        }
        y -= match line.style {
            Style::Title => TITLE_SIZE + 6,
            _ => LEADING,
        };
    }

    // Courier glyphs are 600/1000 em wide.
    let footer_width = page.footer.chars().count() as i64 * FONT_SIZE * 6 / 10;
    text_at(
        &mut operations,
        Style::Body,
        PAGE_WIDTH - MARGIN - footer_width,
        MARGIN / 2,
        &page.footer,
    );
    Content { operations }
}

fn font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn pdf_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

pub fn render(request: &ExportRequest<'_>) -> Result<Vec<u8>, ExportError> {
    let pages = paginate(request);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(font("Courier"));
    let bold_id = doc.add_object(font("Courier-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = page_content(page).encode().map_err(pdf_error)?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ]),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(pdf_error)?;
    Ok(out)
}
