use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::custos::tools::error::{Result, ToolError};
use crate::custos::tools::model::{CellValue, Table};

/// Token identifying the header row of a report.
pub const HEADER_MARKER: &str = "PRODUTO";
/// Line (zero-based) where the header usually sits, after a two-line banner.
const EXPECTED_HEADER_LINE: usize = 2;
/// Candidate delimiters in detection order.
const DELIMITERS: [u8; 3] = [b'\t', b';', b','];

/// Position of the header and the field delimiter of a delimited report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    pub header_row: usize,
    pub delimiter: u8,
}

/// Locates the header row among the raw lines of a report. The third line is
/// checked first; otherwise the first line carrying [`HEADER_MARKER`] wins.
pub fn sniff_layout(lines: &[&str]) -> Option<TextLayout> {
    let header_row = lines
        .get(EXPECTED_HEADER_LINE)
        .filter(|line| line.contains(HEADER_MARKER))
        .map(|_| EXPECTED_HEADER_LINE)
        .or_else(|| lines.iter().position(|line| line.contains(HEADER_MARKER)))?;

    Some(TextLayout {
        header_row,
        delimiter: detect_delimiter(lines[header_row]),
    })
}

/// First of tab, semicolon and comma present in `line`, comma by default.
pub fn detect_delimiter(line: &str) -> u8 {
    DELIMITERS
        .into_iter()
        .find(|delimiter| line.as_bytes().contains(delimiter))
        .unwrap_or(b',')
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of equal value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Loads a delimited report encoded in Latin-1.
pub fn read_text_table(path: &Path) -> Result<Table> {
    let text = decode_latin1(&fs::read(path)?);
    parse_text_table(&text)
}

/// Parses the decoded content of a delimited report. Empty lines are skipped,
/// while delimiter-only lines such as `;;` are kept as blank rows.
pub fn parse_text_table(text: &str) -> Result<Table> {
    let lines: Vec<&str> = text.lines().collect();
    let layout = sniff_layout(&lines).unwrap_or_else(|| {
        debug!("header marker not found, reading from the first line");
        TextLayout {
            header_row: 0,
            delimiter: lines.first().map_or(b',', |line| detect_delimiter(line)),
        }
    });
    debug!(
        header_row = layout.header_row,
        delimiter = %char::from(layout.delimiter).escape_default(),
        "text layout detected"
    );

    let body: String = text.split_inclusive('\n').skip(layout.header_row).collect();
    let mut reader = ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.len() > columns.len() {
            return Err(ToolError::MalformedRow {
                row: layout.header_row + record.position().map_or(0, |pos| pos.line() as usize),
                found: record.len(),
                expected: columns.len(),
            });
        }
        rows.push(record.iter().map(CellValue::from_field).collect());
    }

    Ok(Table::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_on_third_line_uses_its_delimiter() {
        let lines = ["Relatorio de custos", "Emitido em 01/07/2025", "PRODUTO;DESCRICAO;CUSTO"];
        assert_eq!(
            sniff_layout(&lines),
            Some(TextLayout {
                header_row: 2,
                delimiter: b';'
            })
        );
    }

    #[test]
    fn tab_wins_over_other_delimiters() {
        let lines = ["", "", "PRODUTO\tDESCRICAO;X,Y"];
        assert_eq!(sniff_layout(&lines).map(|layout| layout.delimiter), Some(b'\t'));
    }

    #[test]
    fn header_is_searched_when_not_on_third_line() {
        let lines = ["banner", "PRODUTO,CUSTO", "1,2.5", "2,3"];
        assert_eq!(
            sniff_layout(&lines),
            Some(TextLayout {
                header_row: 1,
                delimiter: b','
            })
        );
        assert_eq!(sniff_layout(&["a;b", "1;2"]), None);
        assert_eq!(sniff_layout(&[]), None);
    }

    #[test]
    fn latin1_bytes_decode_to_accented_text() {
        assert_eq!(decode_latin1(b"DESCRI\xc7\xc3O"), "DESCRIÇÃO");
    }

    #[test]
    fn banner_lines_are_skipped() {
        let text = "Empresa X\r\nCustos\r\n PRODUTO ;DESCRICAO;CUSTO\r\nA1;Parafuso;12.5\r\n;;\r\nA2;Porca;3,10\r\n";
        let table = parse_text_table(text).unwrap();
        assert_eq!(table.columns, vec!["PRODUTO", "DESCRICAO", "CUSTO"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][2], CellValue::Number(12.5));
        assert_eq!(table.rows[1], vec![CellValue::Empty; 3]);
        assert_eq!(table.rows[2][2], CellValue::Text("3,10".into()));
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let table = parse_text_table("PRODUTO,CUSTO\nA1\n").unwrap();
        assert_eq!(table.rows[0], vec![CellValue::Text("A1".into()), CellValue::Empty]);

        assert!(matches!(
            parse_text_table("PRODUTO,CUSTO\nA1,1,2\n"),
            Err(ToolError::MalformedRow { found: 3, expected: 2, .. })
        ));
    }
}
