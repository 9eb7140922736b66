use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::custos::tools::model::{CellValue, SourceFile, Table};

/// Name of the date column added to the Base sheet.
pub const DATE_COLUMN: &str = "DATA";

/// Logical fields read from every report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Product,
    Description,
    Group,
    Cost,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Product, Field::Description, Field::Group, Field::Cost];

    /// Accepted column names, in lookup order. Matching ignores case.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Product => &["PRODUTO"],
            Field::Description => &["DESCRICAO", "DESCRIÇÃO"],
            Field::Group => &["GRUPO"],
            Field::Cost => &["CUSTO", "CUSTO MEDIO", "CUSTO MÉDIO"],
        }
    }

    /// Column name used in the consolidated sheet.
    pub fn header(self) -> &'static str {
        self.synonyms()[0]
    }

    /// Index of the first column of `table` matching one of the synonyms.
    pub fn locate(self, table: &Table) -> Option<usize> {
        self.synonyms()
            .iter()
            .find_map(|name| table.column_index_ignore_case(name))
    }
}

/// Column positions of the logical fields within one table.
#[derive(Debug, Clone, Copy)]
pub struct FieldColumns([Option<usize>; 4]);

impl FieldColumns {
    pub fn locate(table: &Table) -> Self {
        Self(Field::ALL.map(|field| field.locate(table)))
    }

    /// Value of `field` in `row`, [`CellValue::Empty`] when the column is absent.
    pub fn get<'a>(&self, row: &'a [CellValue], field: Field) -> &'a CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.0[field as usize]
            .and_then(|index| row.get(index))
            .unwrap_or(EMPTY)
    }
}

/// One product of the consolidated sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntry {
    pub product: CellValue,
    pub description: CellValue,
    pub group: CellValue,
    pub costs: BTreeMap<NaiveDate, CellValue>,
}

/// Rows of one report, tagged with the report date.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseBatch {
    pub date: NaiveDate,
    pub table: Table,
}

/// Sheet holding a single report, named after its raw token.
#[derive(Debug, Clone, PartialEq)]
pub struct DateSheet {
    pub token: String,
    pub table: Table,
}

/// State folded over the reports of a folder.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    dates: BTreeMap<NaiveDate, String>,
    products: Vec<ProductEntry>,
    product_index: HashMap<String, usize>,
    base: Vec<BaseBatch>,
    sheets: Vec<DateSheet>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the date of an accepted report. The date becomes a consolidated
    /// column even when the report later fails to load.
    pub fn register_date(mut self, source: &SourceFile) -> Self {
        if let Some(previous) = self.dates.get(&source.date) {
            warn!(
                date = %source.formatted_date(),
                previous = %previous,
                file = %source.file_name,
                "several reports share a date; costs from the later file overwrite earlier ones"
            );
        }
        self.dates.insert(source.date, source.file_name.clone());
        self
    }

    /// Folds a loaded report into the accumulated state.
    pub fn ingest(mut self, source: &SourceFile, table: Table) -> Self {
        let columns = FieldColumns::locate(&table);
        let mut recorded = 0usize;

        for row in &table.rows {
            let product = columns.get(row, Field::Product);
            if product.is_blank() {
                continue;
            }
            let key = product.to_string().trim().to_string();
            let description = columns.get(row, Field::Description);
            let group = columns.get(row, Field::Group);

            let index = *self.product_index.entry(key).or_insert_with(|| {
                self.products.push(ProductEntry {
                    product: product.clone(),
                    description: description.clone(),
                    group: group.clone(),
                    costs: BTreeMap::new(),
                });
                self.products.len() - 1
            });

            let entry = &mut self.products[index];
            if entry.description.is_blank() && !description.is_blank() {
                entry.description = description.clone();
            }
            if entry.group.is_blank() && !group.is_blank() {
                entry.group = group.clone();
            }
            entry
                .costs
                .insert(source.date, columns.get(row, Field::Cost).clone());
            recorded += 1;
        }
        debug!(file = %source.file_name, recorded, "report consolidated");

        self.dates
            .entry(source.date)
            .or_insert_with(|| source.file_name.clone());
        self.store_sheet(source, &table);
        self.base.push(BaseBatch {
            date: source.date,
            table,
        });
        self
    }

    fn store_sheet(&mut self, source: &SourceFile, table: &Table) {
        let table = without_column(table, DATE_COLUMN);
        match self
            .sheets
            .iter_mut()
            .find(|sheet| sheet.token == source.token)
        {
            Some(sheet) => sheet.table = table,
            None => self.sheets.push(DateSheet {
                token: source.token.clone(),
                table,
            }),
        }
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.dates.keys().copied().collect()
    }

    /// Products in first-seen order.
    pub fn products(&self) -> &[ProductEntry] {
        &self.products
    }

    pub fn base(&self) -> &[BaseBatch] {
        &self.base
    }

    /// Per-date sheets in first-seen order.
    pub fn sheets(&self) -> &[DateSheet] {
        &self.sheets
    }
}

fn without_column(table: &Table, name: &str) -> Table {
    let Some(skip) = table.column_index(name) else {
        return table.clone();
    };
    let keep = |index: &usize| *index != skip;
    Table {
        columns: table
            .columns
            .iter()
            .enumerate()
            .filter(|(index, _)| keep(index))
            .map(|(_, column)| column.clone())
            .collect(),
        rows: table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(index, _)| keep(index))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect(),
    }
}

/// Renders a cost in Brazilian currency notation, e.g. `R$ 12.345,67`.
/// Blank values render empty and non-numeric text is returned unchanged.
/// Thousands are grouped with `.` at every magnitude, so `1234567` renders
/// `R$ 1.234.567,00` rather than swapping only the first separator.
pub fn format_currency(value: &CellValue) -> String {
    if value.is_blank() {
        return String::new();
    }
    match value.as_number() {
        Some(amount) if amount.is_finite() => format_brl(amount),
        _ => value.to_string(),
    }
}

fn format_brl(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (integer, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("R$ {sign}{grouped},{cents}")
}
