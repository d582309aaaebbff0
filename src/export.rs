//! Spreadsheet export and row preview

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};
use tracing::warn;

use crate::error::ExportError;
use crate::pipeline::{FlatRow, PerUrlSummary};

pub const EXPORT_FILE_NAME: &str = "structured_data.xlsx";
pub const EXPORT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const PER_URL_SHEET: &str = "per_url_json";
pub const FLAT_SHEET: &str = "flat_properties";

pub const PER_URL_COLUMNS: [&str; 2] = ["url", "structured_data_json"];
pub const FLAT_COLUMNS: [&str; 6] = ["url", "syntax", "item_index", "item_type", "property", "value"];

/// Rows shown before export
pub const PREVIEW_ROWS: usize = 50;

/// Longest text an XLSX cell accepts
const MAX_CELL_CHARS: usize = 32_767;

/// First `limit` flat rows
pub fn preview(rows: &[FlatRow], limit: usize) -> &[FlatRow] {
    &rows[..rows.len().min(limit)]
}

/// Build the workbook with the per-URL and flat-property sheets
pub fn write_workbook(summaries: &[PerUrlSummary], rows: &[FlatRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(PER_URL_SHEET)?;
    write_header(sheet, &PER_URL_COLUMNS, &header)?;
    for (i, summary) in summaries.iter().enumerate() {
        let row = sheet_row(i);
        write_text(sheet, row, 0, &summary.url)?;
        write_text(sheet, row, 1, &summary.structured_data_json)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(FLAT_SHEET)?;
    write_header(sheet, &FLAT_COLUMNS, &header)?;
    for (i, flat) in rows.iter().enumerate() {
        let row = sheet_row(i);
        write_text(sheet, row, 0, &flat.url)?;
        write_text(sheet, row, 1, &flat.syntax)?;
        if let Some(idx) = flat.item_index {
            sheet.write_number(row, 2, idx as f64)?;
        }
        write_text(sheet, row, 3, &flat.item_type)?;
        write_text(sheet, row, 4, &flat.property)?;
        write_text(sheet, row, 5, &flat.value)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_header(sheet: &mut Worksheet, columns: &[&str], format: &Format) -> Result<(), ExportError> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as ColNum, *name, format)?;
    }
    Ok(())
}

fn write_text(sheet: &mut Worksheet, row: RowNum, col: ColNum, text: &str) -> Result<(), ExportError> {
    if text.is_empty() {
        return Ok(());
    }
    let cell = truncate_cell(text);
    if cell.len() < text.len() {
        warn!(row, col, chars = text.chars().count(), "cell text truncated to XLSX limit");
    }
    sheet.write_string(row, col, cell)?;
    Ok(())
}

/// Data rows start below the header
fn sheet_row(index: usize) -> RowNum {
    RowNum::try_from(index + 1).unwrap_or(RowNum::MAX)
}

fn truncate_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
