use std::path::Path;

use rust_xlsxwriter::{
    Color, Format, FormatPattern, Table, TableColumn, TableStyle, Workbook, Worksheet, XlsxError,
};
use tracing::{debug, warn};

use crate::custos::tools::error::Result;
use crate::custos::tools::model::{CellValue, SheetTable, WorkbookData};

const LIGHT_GRAY: u32 = 0xF2F2F2;
const WIDTH_PADDING: usize = 2;
const MAX_COLUMN_WIDTH: usize = 255;

/// Cell formats applied to sheets rendered as tables.
struct TableFormats {
    header: Format,
    even: Format,
    odd: Format,
}

impl TableFormats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::Black)
                .set_pattern(FormatPattern::Solid),
            even: Format::new()
                .set_background_color(Color::RGB(LIGHT_GRAY))
                .set_pattern(FormatPattern::Solid),
            odd: Format::new()
                .set_background_color(Color::White)
                .set_pattern(FormatPattern::Solid),
        }
    }

    /// Fill for a data row, alternating on the 1-based Excel row number.
    fn row_format(&self, excel_row: u32) -> &Format {
        if excel_row % 2 == 0 { &self.even } else { &self.odd }
    }
}

/// Writes the provided workbook data to the given path.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let formats = TableFormats::new();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(table.sheet_name.as_str())?;

        let styled = !table.rows.is_empty()
            && match add_table(worksheet, table) {
                Ok(()) => true,
                Err(err) => {
                    warn!(sheet = %table.sheet_name, error = %err, "failed to format sheet as a table");
                    false
                }
            };

        write_cells(worksheet, table, styled.then_some(&formats))?;
        fit_columns(worksheet, table)?;
        debug!(sheet = %table.sheet_name, rows = table.rows.len(), styled, "sheet written");
    }

    workbook_writer.save(path)?;
    Ok(())
}

/// Name of the Excel table object backing a sheet.
pub fn table_name(sheet_name: &str) -> String {
    format!("Table_{sheet_name}").replace([' ', '-'], "_")
}

fn add_table(worksheet: &mut Worksheet, table: &SheetTable) -> std::result::Result<(), XlsxError> {
    let columns: Vec<TableColumn> = table
        .columns
        .iter()
        .map(|header| TableColumn::new().set_header(header.as_str()))
        .collect();

    let mut excel_table = Table::new();
    excel_table
        .set_name(table_name(&table.sheet_name))
        .set_style(TableStyle::Medium9)
        .set_banded_rows(true)
        .set_columns(&columns);

    let col_end = (table.columns.len() as u16).saturating_sub(1);
    worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    Ok(())
}

fn write_cells(
    worksheet: &mut Worksheet,
    table: &SheetTable,
    formats: Option<&TableFormats>,
) -> Result<()> {
    for (col_idx, header) in table.columns.iter().enumerate() {
        let cell = CellValue::Text(header.clone());
        write_cell(worksheet, 0, col_idx as u16, &cell, formats.map(|f| &f.header))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        let format = formats.map(|f| f.row_format(sheet_row + 1));
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, sheet_row, col_idx as u16, cell, format)?;
        }
    }

    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    match (cell, format) {
        (CellValue::Empty, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (CellValue::Empty, None) => {}
        (CellValue::Number(value), Some(format)) => {
            worksheet.write_number_with_format(row, col, *value, format)?;
        }
        (CellValue::Number(value), None) => {
            worksheet.write_number(row, col, *value)?;
        }
        (CellValue::Text(value), Some(format)) => {
            worksheet.write_string_with_format(row, col, value.as_str(), format)?;
        }
        (CellValue::Text(value), None) => {
            worksheet.write_string(row, col, value.as_str())?;
        }
        (CellValue::Bool(value), Some(format)) => {
            worksheet.write_boolean_with_format(row, col, *value, format)?;
        }
        (CellValue::Bool(value), None) => {
            worksheet.write_boolean(row, col, *value)?;
        }
    }
    Ok(())
}

/// Sets each column to the longest rendered value plus padding.
fn fit_columns(worksheet: &mut Worksheet, table: &SheetTable) -> Result<()> {
    for (col_idx, width) in column_widths(table).into_iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, width as f64)?;
    }
    Ok(())
}

/// Character width of every column: the longest header or cell, plus padding.
pub fn column_widths(table: &SheetTable) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(col_idx, header)| {
            let longest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col_idx))
                .map(|cell| cell.to_string().chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (longest + WIDTH_PADDING).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}
