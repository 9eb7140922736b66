use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, error, instrument};

use crate::custos::tools::error::{Result, ToolError};
use crate::custos::tools::model::{SourceFile, SourceKind};

/// Prefix every report file name starts with.
pub const FILE_PREFIX: &str = "ev";
const TOKEN_LEN: usize = 6;

/// Result of scanning a report folder.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted files, in directory-listing order.
    pub sources: Vec<SourceFile>,
    /// Candidate files whose date token could not be parsed.
    pub rejected: Vec<ToolError>,
}

/// Lists `dir` and returns the report files it contains. Files whose token
/// fails to parse are logged and reported in [`ScanOutcome::rejected`].
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn scan_directory(dir: &Path) -> Result<ScanOutcome> {
    let mut outcome = ScanOutcome::default();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();

        match classify(dir, &file_name) {
            Ok(Some(source)) => {
                debug!(file = %file_name, date = %source.formatted_date(), "report discovered");
                outcome.sources.push(source);
            }
            Ok(None) => {}
            Err(err) => {
                error!(file = %file_name, error = %err, "skipping file with invalid date token");
                outcome.rejected.push(err);
            }
        }
    }

    Ok(outcome)
}

/// Returns the storage kind for report names, `None` for unrelated files.
pub fn source_kind(file_name: &str) -> Option<SourceKind> {
    if !file_name.starts_with(FILE_PREFIX) {
        return None;
    }
    if file_name.ends_with(".xlsx") {
        Some(SourceKind::Spreadsheet)
    } else if file_name.ends_with(".csv") {
        Some(SourceKind::DelimitedText)
    } else {
        None
    }
}

/// Turns a directory entry into a [`SourceFile`].
pub fn classify(dir: &Path, file_name: &str) -> Result<Option<SourceFile>> {
    let Some(kind) = source_kind(file_name) else {
        return Ok(None);
    };

    let token: String = file_name
        .chars()
        .skip(FILE_PREFIX.len())
        .take(TOKEN_LEN)
        .collect();
    let date = parse_date_token(&token).ok_or_else(|| ToolError::InvalidDateToken {
        file: file_name.to_string(),
        token: token.clone(),
    })?;

    Ok(Some(SourceFile {
        file_name: file_name.to_string(),
        path: dir.join(file_name),
        kind,
        token,
        date,
    }))
}

/// Parses a `DDMMYY` token.
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    if token.len() != TOKEN_LEN || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(token, "%d%m%y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_parses_to_calendar_date() {
        assert_eq!(
            parse_date_token("010725"),
            NaiveDate::from_ymd_opt(2025, 7, 1)
        );
        assert_eq!(
            parse_date_token("311224"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
    }

    #[test]
    fn invalid_tokens_are_rejected() {
        assert_eq!(parse_date_token("320125"), None);
        assert_eq!(parse_date_token("011325"), None);
        assert_eq!(parse_date_token("0107.x"), None);
        assert_eq!(parse_date_token("01072"), None);
    }

    #[test]
    fn only_prefixed_reports_are_candidates() {
        assert_eq!(source_kind("ev010725.xlsx"), Some(SourceKind::Spreadsheet));
        assert_eq!(source_kind("ev010725.csv"), Some(SourceKind::DelimitedText));
        assert_eq!(source_kind("ev010725.txt"), None);
        assert_eq!(source_kind("EV010725.csv"), None);
        assert_eq!(source_kind("relatorio.csv"), None);
    }

    #[test]
    fn classify_reports_bad_tokens() {
        let dir = Path::new("reports");
        let source = classify(dir, "ev150625.csv").unwrap().unwrap();
        assert_eq!(source.token, "150625");
        assert_eq!(source.formatted_date(), "15/06/2025");
        assert_eq!(source.path, dir.join("ev150625.csv"));

        assert!(classify(dir, "notes.txt").unwrap().is_none());
        assert!(matches!(
            classify(dir, "ev9.csv"),
            Err(ToolError::InvalidDateToken { .. })
        ));
    }
}
