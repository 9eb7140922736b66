use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Display format used for dates in the Base sheet and the consolidated
/// column headers.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Represents a single cell loaded from a source report.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell or missing field.
    #[default]
    Empty,
    /// Numeric cell.
    Number(f64),
    /// Textual cell.
    Text(String),
    /// Boolean cell.
    Bool(bool),
}

impl CellValue {
    /// Builds a cell from a raw text field, promoting plain decimal numbers.
    pub fn from_field(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return CellValue::Empty;
        }
        match parse_plain_number(raw) {
            Some(number) => CellValue::Number(number),
            None => CellValue::Text(raw.to_string()),
        }
    }

    /// Returns `true` when the cell carries no usable value.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(value) => value.is_nan(),
            CellValue::Text(value) => value.trim().is_empty(),
            CellValue::Bool(_) => false,
        }
    }

    /// Numeric interpretation of the cell, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) if !value.is_nan() => Some(*value),
            CellValue::Text(value) => parse_plain_number(value),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

/// Parses text such as `12.5`, `-3` or `1e3`. Locale-formatted values like
/// `12,50` are rejected.
pub fn parse_plain_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if !trimmed.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// A loaded report: ordered column names plus rows padded to the column count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates a table, normalising the header names and padding short rows.
    pub fn new(raw_columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = normalize_headers(raw_columns);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Exact-match column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Case-insensitive column lookup.
    pub fn column_index_ignore_case(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.columns
            .iter()
            .position(|column| column.to_lowercase() == wanted)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trims header names, names blank headers after their position and suffixes
/// repeated names so that every column is addressable.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (index, name) in raw.into_iter().enumerate() {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {index}")
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut counter = 1;
        while seen.contains(&candidate.to_lowercase()) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.to_lowercase());
        headers.push(candidate);
    }

    headers
}

/// Storage format of a source report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.xlsx` workbook.
    Spreadsheet,
    /// `.csv` delimited text.
    DelimitedText,
}

/// A report file accepted by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file_name: String,
    pub path: PathBuf,
    pub kind: SourceKind,
    /// The raw six-digit token following the prefix.
    pub token: String,
    pub date: NaiveDate,
}

impl SourceFile {
    /// Date rendered as `DD/MM/YYYY`.
    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_trimmed_and_deduplicated() {
        let headers = normalize_headers(vec![
            " PRODUTO ".into(),
            "".into(),
            "CUSTO".into(),
            "custo".into(),
        ]);
        assert_eq!(headers, vec!["PRODUTO", "Unnamed: 1", "CUSTO", "custo.1"]);
    }

    #[test]
    fn plain_numbers_are_promoted() {
        assert_eq!(CellValue::from_field("12.5"), CellValue::Number(12.5));
        assert_eq!(CellValue::from_field("12,50"), CellValue::Text("12,50".into()));
        assert_eq!(CellValue::from_field("  "), CellValue::Empty);
        assert_eq!(CellValue::from_field("-"), CellValue::Text("-".into()));
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1234.0).to_string(), "1234");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
    }
}
