use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate};

use crate::custos::tools::error::{Result, ToolError};
use crate::custos::tools::model::{CellValue, DATE_FORMAT, Table};

/// Banner rows preceding the header of exported spreadsheets.
pub const BANNER_ROWS: u32 = 2;

/// Reads the first worksheet of a report workbook, skipping the banner rows.
pub fn read_sheet_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ToolError::InvalidWorkbook("workbook has no worksheets".into()))?
        .map_err(ToolError::from)?;
    Ok(range_to_table(&range, BANNER_ROWS))
}

/// Converts a worksheet range into a table whose header sits on the absolute
/// sheet row `header_row`.
pub fn range_to_table(range: &Range<DataType>, header_row: u32) -> Table {
    let (Some((_, first_col)), Some((last_row, last_col))) = (range.start(), range.end()) else {
        return Table::default();
    };
    if last_row < header_row {
        return Table::default();
    }

    let read_row = |row: u32| -> Vec<CellValue> {
        (first_col..=last_col)
            .map(|col| cell_to_value(range.get_value((row, col))))
            .collect()
    };

    let columns = read_row(header_row)
        .iter()
        .map(ToString::to_string)
        .collect();
    let rows = (header_row + 1..=last_row)
        .map(read_row)
        .filter(|row| !row.iter().all(CellValue::is_blank))
        .collect();

    Table::new(columns, rows)
}

fn cell_to_value(cell: Option<&DataType>) -> CellValue {
    match cell {
        Some(DataType::String(value)) if value.trim().is_empty() => CellValue::Empty,
        Some(DataType::String(value)) => CellValue::Text(value.clone()),
        Some(DataType::Float(value)) => CellValue::Number(*value),
        Some(DataType::Int(value)) => CellValue::Number(*value as f64),
        Some(DataType::Bool(value)) => CellValue::Bool(*value),
        Some(DataType::DateTime(serial)) => serial_to_text(*serial)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Number(*serial)),
        Some(DataType::Empty) | None => CellValue::Empty,
        Some(other) => CellValue::Text(other.to_string()),
    }
}

/// Renders an Excel date serial (1900 system) as `DD/MM/YYYY`.
fn serial_to_text(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(serial.trunc() as i64))?;
    Some(date.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_is_absolute() {
        let mut range: Range<DataType> = Range::new((0, 0), (4, 1));
        range.set_value((0, 0), DataType::String("Relatorio".into()));
        range.set_value((2, 0), DataType::String(" PRODUTO".into()));
        range.set_value((2, 1), DataType::String("CUSTO ".into()));
        range.set_value((3, 0), DataType::String("A1".into()));
        range.set_value((3, 1), DataType::Float(10.5));

        let table = range_to_table(&range, BANNER_ROWS);
        assert_eq!(table.columns, vec!["PRODUTO", "CUSTO"]);
        assert_eq!(
            table.rows,
            vec![vec![CellValue::Text("A1".into()), CellValue::Number(10.5)]]
        );
    }

    #[test]
    fn serial_dates_render_as_calendar_dates() {
        assert_eq!(serial_to_text(45839.0).as_deref(), Some("01/07/2025"));
    }
}
