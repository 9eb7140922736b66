use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool scans, loads, consolidates, or writes cost reports.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors raised while parsing delimited text reports.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when the date token embedded in a file name is not a valid
    /// `DDMMYY` date.
    #[error("invalid date token '{token}' in file {file}")]
    InvalidDateToken { file: String, token: String },

    /// Raised when a spreadsheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a data row carries more fields than the header declares.
    #[error("row {row} has {found} fields but the header declares {expected}")]
    MalformedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input folder not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
