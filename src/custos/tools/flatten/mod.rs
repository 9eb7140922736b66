use std::collections::{HashMap, HashSet};

use crate::custos::tools::consolidate::{Accumulator, BaseBatch, DATE_COLUMN, Field, format_currency};
use crate::custos::tools::model::{CellValue, DATE_FORMAT, SheetTable, WorkbookData};

/// Sheet holding the product × date pivot.
pub const CONSOLIDATED_SHEET: &str = "Consolidado";
/// Sheet holding every source row tagged with its date.
pub const BASE_SHEET: &str = "Base";

/// Lays the accumulated state out as the ordered sheets of the output
/// workbook: the pivot, the Base sheet when any report loaded, then one sheet
/// per report token.
pub fn build_workbook(acc: &Accumulator) -> WorkbookData {
    let mut tables = vec![build_consolidated_table(acc)];

    if !acc.base().is_empty() {
        tables.push(build_base_table(acc.base()));
    }

    tables.extend(acc.sheets().iter().map(|sheet| SheetTable {
        sheet_name: sheet.token.clone(),
        columns: sheet.table.columns.clone(),
        rows: sheet.table.rows.clone(),
    }));

    WorkbookData { tables }
}

/// One row per product, one column per date in ascending order.
pub fn build_consolidated_table(acc: &Accumulator) -> SheetTable {
    let dates = acc.dates();
    if acc.products().is_empty() && dates.is_empty() {
        return SheetTable {
            sheet_name: CONSOLIDATED_SHEET.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        };
    }

    let mut columns: Vec<String> = [Field::Product, Field::Description, Field::Group]
        .iter()
        .map(|field| field.header().to_string())
        .collect();
    columns.extend(dates.iter().map(|date| date.format(DATE_FORMAT).to_string()));

    let rows = acc
        .products()
        .iter()
        .map(|entry| {
            let mut row = vec![
                entry.product.clone(),
                entry.description.clone(),
                entry.group.clone(),
            ];
            row.extend(dates.iter().map(|date| {
                let rendered = entry.costs.get(date).map(format_currency).unwrap_or_default();
                if rendered.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(rendered)
                }
            }));
            row
        })
        .collect();

    SheetTable {
        sheet_name: CONSOLIDATED_SHEET.to_string(),
        columns,
        rows,
    }
}

/// Concatenates every loaded report. Columns are the union of the report
/// columns in first-seen order, preceded by the report date. A source column
/// named exactly `DATA` is replaced by the report date; names that differ from
/// an existing column only in case get a `.1`, `.2`... suffix.
pub fn build_base_table(batches: &[BaseBatch]) -> SheetTable {
    let mut columns = vec![DATE_COLUMN.to_string()];
    let mut taken: HashSet<String> = HashSet::from([DATE_COLUMN.to_lowercase()]);
    let mut positions: HashMap<String, usize> = HashMap::new();
    for batch in batches {
        for column in &batch.table.columns {
            if column == DATE_COLUMN || positions.contains_key(column) {
                continue;
            }
            let mut header = column.clone();
            let mut counter = 1;
            while taken.contains(&header.to_lowercase()) {
                header = format!("{column}.{counter}");
                counter += 1;
            }
            taken.insert(header.to_lowercase());
            positions.insert(column.clone(), columns.len());
            columns.push(header);
        }
    }

    let mut rows = Vec::new();
    for batch in batches {
        let date = CellValue::Text(batch.date.format(DATE_FORMAT).to_string());
        for source_row in &batch.table.rows {
            let mut row = vec![CellValue::Empty; columns.len()];
            row[0] = date.clone();
            for (column, cell) in batch.table.columns.iter().zip(source_row) {
                if let Some(&position) = positions.get(column) {
                    row[position] = cell.clone();
                }
            }
            rows.push(row);
        }
    }

    SheetTable {
        sheet_name: BASE_SHEET.to_string(),
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custos::tools::model::{SourceFile, SourceKind, Table};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn source(token: &str) -> SourceFile {
        SourceFile {
            file_name: format!("ev{token}.csv"),
            path: PathBuf::from(format!("ev{token}.csv")),
            kind: SourceKind::DelimitedText,
            token: token.to_string(),
            date: NaiveDate::parse_from_str(token, "%d%m%y").unwrap(),
        }
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn empty_accumulator_yields_empty_consolidated_sheet() {
        let workbook = build_workbook(&Accumulator::new());
        assert_eq!(workbook.tables.len(), 1);
        assert_eq!(workbook.tables[0].sheet_name, CONSOLIDATED_SHEET);
        assert!(workbook.tables[0].columns.is_empty());
        assert!(workbook.tables[0].rows.is_empty());
    }

    #[test]
    fn dates_are_sorted_and_kept_without_data() {
        let later = source("150725");
        let earlier = source("010725");
        let failed = source("100725");
        let table = Table::new(
            vec!["PRODUTO".into(), "CUSTO".into()],
            vec![vec![text("A1"), CellValue::Number(12345.67)]],
        );

        let acc = Accumulator::new()
            .register_date(&later)
            .ingest(&later, table.clone())
            .register_date(&failed)
            .register_date(&earlier)
            .ingest(&earlier, table);

        let workbook = build_workbook(&acc);
        let names: Vec<&str> = workbook
            .tables
            .iter()
            .map(|table| table.sheet_name.as_str())
            .collect();
        assert_eq!(names, vec![CONSOLIDATED_SHEET, BASE_SHEET, "150725", "010725"]);

        let consolidated = &workbook.tables[0];
        assert_eq!(
            consolidated.columns,
            vec!["PRODUTO", "DESCRICAO", "GRUPO", "01/07/2025", "10/07/2025", "15/07/2025"]
        );
        assert_eq!(
            consolidated.rows,
            vec![vec![
                text("A1"),
                CellValue::Empty,
                CellValue::Empty,
                text("R$ 12.345,67"),
                CellValue::Empty,
                text("R$ 12.345,67"),
            ]]
        );
    }

    #[test]
    fn base_sheet_unions_columns_behind_the_date() {
        let first = Table::new(
            vec!["PRODUTO".into(), "CUSTO".into()],
            vec![vec![text("A1"), CellValue::Number(1.0)]],
        );
        let second = Table::new(
            vec!["PRODUTO".into(), "GRUPO".into()],
            vec![vec![text("B2"), text("G")]],
        );
        let acc = Accumulator::new()
            .ingest(&source("010725"), first)
            .ingest(&source("020725"), second);

        let base = build_base_table(acc.base());
        assert_eq!(base.columns, vec!["DATA", "PRODUTO", "CUSTO", "GRUPO"]);
        assert_eq!(
            base.rows,
            vec![
                vec![text("01/07/2025"), text("A1"), CellValue::Number(1.0), CellValue::Empty],
                vec![text("02/07/2025"), text("B2"), CellValue::Empty, text("G")],
            ]
        );
    }

    #[test]
    fn base_sheet_keeps_case_variant_columns() {
        let first = Table::new(
            vec!["PRODUTO".into(), "Data".into()],
            vec![vec![text("A1"), text("15/06/2025")]],
        );
        let second = Table::new(
            vec!["Produto".into(), "CUSTO".into()],
            vec![vec![text("B2"), CellValue::Number(2.0)]],
        );
        let acc = Accumulator::new()
            .ingest(&source("010725"), first)
            .ingest(&source("020725"), second);

        let base = build_base_table(acc.base());
        assert_eq!(
            base.columns,
            vec!["DATA", "PRODUTO", "Data.1", "Produto.1", "CUSTO"]
        );
        assert_eq!(
            base.rows,
            vec![
                vec![
                    text("01/07/2025"),
                    text("A1"),
                    text("15/06/2025"),
                    CellValue::Empty,
                    CellValue::Empty,
                ],
                vec![
                    text("02/07/2025"),
                    CellValue::Empty,
                    CellValue::Empty,
                    text("B2"),
                    CellValue::Number(2.0),
                ],
            ]
        );
        assert_eq!(acc.sheets()[0].table.columns, vec!["PRODUTO", "Data"]);
    }

    #[test]
    fn source_date_column_is_replaced_by_report_date() {
        let table = Table::new(
            vec!["DATA".into(), "PRODUTO".into()],
            vec![vec![text("31/12/1999"), text("A1")]],
        );
        let acc = Accumulator::new().ingest(&source("010725"), table);

        let base = build_base_table(acc.base());
        assert_eq!(base.columns, vec!["DATA", "PRODUTO"]);
        assert_eq!(base.rows, vec![vec![text("01/07/2025"), text("A1")]]);
    }
}
