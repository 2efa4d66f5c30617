//! Named-column table view over canonical and detail records

use crate::record::{format_timestamp, DetailRecord};
use crate::resolver::CanonicalBook;
use crate::schema::{CANONICAL_COLUMNS, DETAIL_COLUMNS};
use crate::unique::UniqueList;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator used when a list cell is rendered as text
pub const LIST_SEPARATOR: &str = " | ";

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A table of typed cells addressed by column name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table name (e.g. "dim_book")
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with the given columns
    pub fn new(name: impl Into<String>, column_names: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: column_names
                .iter()
                .enumerate()
                .map(|(i, name)| Column::new(name.to_string(), i))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append a column that every existing row leaves empty
    pub fn add_column(&mut self, name: impl Into<String>) -> usize {
        let index = self.columns.len();
        self.columns.push(Column::new(name.into(), index));
        for row in &mut self.rows {
            row.cells.push(CellValue::Empty);
        }
        index
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(Row::new(cells));
    }

    /// All cells of a column, or `None` if the column does not exist
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let index = self.find_column(name)?.index;
        Some(self.rows.iter().map(move |row| row.get(index).unwrap_or(&EMPTY_CELL)))
    }

    /// Build the canonical table (`dim_book`)
    pub fn from_canonical(books: &[CanonicalBook]) -> Self {
        let mut table = Table::new("dim_book", CANONICAL_COLUMNS);
        for book in books {
            table.push_row(vec![
                CellValue::String(book.book_id.clone()),
                CellValue::from(&book.title),
                CellValue::from(&book.title_normalized),
                CellValue::from(&book.author_principal),
                CellValue::from(&book.authors),
                CellValue::from(&book.editorial),
                book.year.map_or(CellValue::Empty, |y| CellValue::Integer(y.into())),
                CellValue::from(&book.pub_date),
                CellValue::from(&book.language),
                CellValue::from(&book.isbn10),
                CellValue::from(&book.isbn13),
                CellValue::Bool(book.isbn13_valid),
                book.pages.map_or(CellValue::Empty, |p| CellValue::Integer(p.into())),
                CellValue::from(&book.format),
                CellValue::from(&book.categories),
                book.price_amount.map_or(CellValue::Empty, CellValue::Float),
                CellValue::from(&book.price_currency),
                CellValue::String(book.winning_source.to_string()),
                CellValue::String(format_timestamp(&book.last_updated)),
            ]);
        }
        table
    }

    /// Build the detail table (`book_source_detail`)
    ///
    /// Passthrough fields become extra columns after the fixed ones, in
    /// order of first appearance.
    pub fn from_detail(details: &[DetailRecord]) -> Self {
        let mut table = Table::new("book_source_detail", DETAIL_COLUMNS);
        for detail in details {
            let record = &detail.record;
            for name in record.passthrough.keys() {
                if table.find_column(name).is_none() {
                    table.add_column(name.clone());
                }
            }

            let mut cells = vec![
                CellValue::String(record.source.to_string()),
                CellValue::Integer(record.row_id as i64),
                CellValue::from(&record.title),
                CellValue::from(&record.author_principal),
                CellValue::from(&record.authors),
                CellValue::from(&record.categories),
                CellValue::from(&record.publisher),
                CellValue::from(&record.pub_date),
                CellValue::from(&record.language),
                record.price_amount.map_or(CellValue::Empty, CellValue::Float),
                CellValue::from(&record.price_currency),
                CellValue::from(&record.isbn10),
                CellValue::from(&record.isbn13),
                CellValue::String(record.candidate_key.clone()),
                CellValue::String(format_timestamp(&detail.timestamp_ingesta)),
            ];
            cells.resize(table.column_count(), CellValue::Empty);
            for (name, value) in &record.passthrough {
                if let Some(column) = table.find_column(name) {
                    cells[column.index] = CellValue::from_json(value);
                }
            }
            table.push_row(cells);
        }
        table
    }
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Boolean value
    Bool(bool),
    /// Ordered list of strings
    List(Vec<String>),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Convert a JSON value, keeping numbers numeric
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map_or(CellValue::Empty, CellValue::Float),
            },
            Value::String(s) => CellValue::String(s.clone()),
            Value::Array(items) => CellValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(_) => CellValue::String(value.to_string()),
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }

    /// Convert to JSON for structured exports
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Float(f) => Value::from(*f),
            CellValue::String(s) => Value::from(s.as_str()),
            CellValue::Bool(b) => Value::from(*b),
            CellValue::List(items) => Value::from(items.clone()),
            CellValue::Empty => Value::Null,
        }
    }
}

impl From<&Option<String>> for CellValue {
    fn from(value: &Option<String>) -> Self {
        value.clone().map_or(CellValue::Empty, CellValue::String)
    }
}

impl From<&UniqueList> for CellValue {
    fn from(list: &UniqueList) -> Self {
        CellValue::List(list.as_slice().to_vec())
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::List(items) => write!(f, "{}", items.join(LIST_SEPARATOR)),
            CellValue::Empty => write!(f, ""),
        }
    }
}
