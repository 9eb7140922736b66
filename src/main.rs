use std::path::{Path, PathBuf};

use clap::Parser;
use custos_tools::sync;
use custos_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;

    if !cli.folder.exists() {
        return Err(ToolError::MissingInput(cli.folder));
    }
    let folder = cli.folder.canonicalize()?;
    let output_dir = cli.output_dir.unwrap_or_else(default_output_dir);

    let output = sync::folder_to_excel(&folder, &output_dir)?;
    println!("Processo concluído. Arquivo gerado em: {}", output.display());
    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

/// The user's Downloads folder, or the working directory when no home is known.
fn default_output_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| Path::new(&home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate dated product cost reports into a single workbook."
)]
struct Cli {
    /// Folder holding the `evDDMMYY.xlsx` / `evDDMMYY.csv` reports.
    #[arg(default_value = ".")]
    folder: PathBuf,

    /// Directory receiving the consolidated workbook [default: ~/Downloads].
    #[arg(long)]
    output_dir: Option<PathBuf>,
}
