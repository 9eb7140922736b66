pub mod excel_read;
pub mod excel_write;
pub mod text_read;

use tracing::debug;

use crate::custos::tools::error::Result;
use crate::custos::tools::model::{SourceFile, SourceKind, Table};

/// Loads a report into a table, dispatching on its storage kind.
pub fn load_table(source: &SourceFile) -> Result<Table> {
    let table = match source.kind {
        SourceKind::Spreadsheet => excel_read::read_sheet_table(&source.path)?,
        SourceKind::DelimitedText => text_read::read_text_table(&source.path)?,
    };
    debug!(
        file = %source.file_name,
        columns = table.columns.len(),
        rows = table.rows.len(),
        "report loaded"
    );
    Ok(table)
}
