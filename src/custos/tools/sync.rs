use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::custos::tools::consolidate::Accumulator;
use crate::custos::tools::error::{Result, ToolError};
use crate::custos::tools::flatten::build_workbook;
use crate::custos::tools::io::{self, excel_write};
use crate::custos::tools::scan::scan_directory;

/// Prefix of the generated workbook name.
pub const OUTPUT_PREFIX: &str = "Custos de produtos";

/// Builds the output file name from the source folder name, keeping the
/// trailing `" - "` separated token (`"Custos - Julho 2025"` → `Julho 2025`).
pub fn output_file_name(folder: &Path) -> String {
    let folder_name = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let period = folder_name.rsplit(" - ").next().unwrap_or_default();
    format!("{OUTPUT_PREFIX} - {period}.xlsx")
}

/// Scans `folder`, loads and consolidates every report, and returns the
/// accumulated state. Reports that fail to load are logged and skipped.
#[instrument(level = "info", skip_all, fields(folder = %folder.display()))]
pub fn consolidate_folder(folder: &Path) -> Result<Accumulator> {
    let scan = scan_directory(folder)?;
    info!(
        accepted = scan.sources.len(),
        rejected = scan.rejected.len(),
        "report folder scanned"
    );

    let accumulator = scan
        .sources
        .iter()
        .fold(Accumulator::new(), |acc, source| {
            let acc = acc.register_date(source);
            match io::load_table(source) {
                Ok(table) => acc.ingest(source, table),
                Err(err) => {
                    error!(file = %source.file_name, error = %err, "failed to process report");
                    acc
                }
            }
        });

    Ok(accumulator)
}

/// Consolidates the reports of `folder` into a workbook written under
/// `output_dir`. Returns the path of the written workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(folder = %folder.display(), output_dir = %output_dir.display())
)]
pub fn folder_to_excel(folder: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !folder.is_dir() {
        return Err(ToolError::MissingInput(folder.to_path_buf()));
    }

    let accumulator = consolidate_folder(folder)?;
    let workbook = build_workbook(&accumulator);
    info!(
        products = accumulator.products().len(),
        dates = accumulator.dates().len(),
        sheet_count = workbook.tables.len(),
        "workbook constructed"
    );

    let output = output_dir.join(output_file_name(folder));
    excel_write::write_workbook(&output, &workbook)?;
    Ok(output)
}
