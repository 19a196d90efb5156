use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use super::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Numeric cells
// ---------------------------------------------------------------------------

/// Share of non-missing cells that must parse as numbers for a column to be
/// offered as a sample column.
pub const NUMERIC_FRACTION: f64 = 0.9;

/// Cell contents treated as "no value" rather than as a broken number.
const MISSING_MARKERS: &[&str] = &["na", "n/a", "nan", "null", "none", "-"];

/// Whether a cell holds one of the recognised missing-value markers.
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|m| trimmed.eq_ignore_ascii_case(m))
}

/// Interpret a cell as a finite number. Missing markers, text, `inf` and
/// `NaN` all yield `None`.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Table – the raw parsed file
// ---------------------------------------------------------------------------

/// A rectangular table of text cells with a named header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A clipped view of a [`Table`] for the preview window.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, checking that every row is as wide as the header and
    /// that header names are unique.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DataError::Format(format!("duplicate column name '{name}'")));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DataError::Format(format!(
                    "row {} has {} fields, header has {}",
                    i + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text at (row, col). Both indices must be in range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[col].as_str())
    }

    /// Values occurring more than once in a column, each listed once, in
    /// order of first appearance.
    pub fn duplicate_values(&self, col: usize) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for v in self.column_values(col) {
            *counts.entry(v).or_default() += 1;
        }
        let mut reported = BTreeSet::new();
        self.column_values(col)
            .filter(|v| counts[v] > 1 && reported.insert(*v))
            .map(str::to_string)
            .collect()
    }

    /// Write the table back out as tab-separated text.
    pub fn write_tsv<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        out.write_record(&self.columns)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()
    }

    /// The ID column first, then up to `cols - 1` other columns, limited to
    /// the first `rows` rows.
    pub fn preview(&self, rows: usize, cols: usize, id_column: &str) -> TablePreview {
        let id_idx = self.column_index(id_column).unwrap_or(0);
        let indices: Vec<usize> = std::iter::once(id_idx)
            .chain(
                (0..self.n_cols())
                    .filter(|&i| i != id_idx)
                    .take(cols.saturating_sub(1).max(1)),
            )
            .collect();

        TablePreview {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .take(rows)
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – a table with a chosen ID column
// ---------------------------------------------------------------------------

/// Header names recognised as a likely ID column, compared lower-cased.
const LIKELY_ID_NAMES: &[&str] = &[
    "id", "ids", "name", "names", "symbol", "gene", "genes", "gene_symbol",
    "gene symbol", "ensembl", "ensembl_id", "row", "rowid", "row_id",
];

/// Guess the ID column: the first header with a familiar name, otherwise
/// the first column.
pub fn detect_id_column(columns: &[String]) -> usize {
    columns
        .iter()
        .position(|c| LIKELY_ID_NAMES.contains(&c.trim().to_lowercase().as_str()))
        .unwrap_or(0)
}

/// What to do when the ID column holds the same value twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`DataError::DuplicateRowKey`].
    Reject,
    /// Keep the first occurrence, suffix later ones `#2`, `#3`, ...
    Disambiguate,
}

/// The loaded table plus everything derived from the ID column choice.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: Table,
    /// File name the table was loaded from.
    pub source_name: String,
    id_column: String,
    row_keys: Vec<String>,
    row_index: BTreeMap<String, usize>,
    numeric_columns: Vec<String>,
}

impl Dataset {
    /// Wrap a table, using [`detect_id_column`] for the initial ID column.
    pub fn new(table: Table, source_name: &str, policy: DuplicatePolicy) -> Result<Self> {
        let id_column = table
            .columns()
            .get(detect_id_column(table.columns()))
            .cloned()
            .ok_or_else(|| DataError::Format("table has no columns".into()))?;

        let mut dataset = Dataset {
            table,
            source_name: source_name.to_string(),
            id_column: String::new(),
            row_keys: Vec::new(),
            row_index: BTreeMap::new(),
            numeric_columns: Vec::new(),
        };
        dataset.set_id_column(&id_column, policy)?;
        Ok(dataset)
    }

    /// Switch the ID column and recompute row keys and sample columns.
    /// On error the dataset is left as it was.
    pub fn set_id_column(&mut self, name: &str, policy: DuplicatePolicy) -> Result<()> {
        let idx = self
            .table
            .column_index(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;

        let keys = match policy {
            DuplicatePolicy::Reject => {
                let dups = self.table.duplicate_values(idx);
                if !dups.is_empty() {
                    return Err(DataError::DuplicateRowKey { keys: dups });
                }
                self.table.column_values(idx).map(str::to_string).collect()
            }
            DuplicatePolicy::Disambiguate => disambiguate(self.table.column_values(idx)),
        };

        self.row_index = keys
            .iter()
            .enumerate()
            .map(|(i, k): (usize, &String)| (k.clone(), i))
            .collect();
        self.row_keys = keys;
        self.id_column = name.to_string();
        self.numeric_columns = (0..self.table.n_cols())
            .filter(|&i| i != idx && column_is_numeric(&self.table, i))
            .map(|i| self.table.columns()[i].clone())
            .collect();
        Ok(())
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Row keys in table order.
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Columns offered as sample columns, in header order.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == name)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.row_index.contains_key(key)
    }

    /// Raw text of the cell at (row key, column).
    pub fn raw_cell(&self, row_key: &str, column: &str) -> Result<&str> {
        let row = *self
            .row_index
            .get(row_key)
            .ok_or_else(|| DataError::UnknownRowKey(row_key.to_string()))?;
        let col = self
            .table
            .column_index(column)
            .ok_or_else(|| DataError::ColumnNotFound(column.to_string()))?;
        Ok(self.table.cell(row, col))
    }

    /// Numeric value of the cell at (row key, column).
    pub fn value(&self, row_key: &str, column: &str) -> Result<f64> {
        let raw = self.raw_cell(row_key, column)?;
        parse_numeric(raw).ok_or_else(|| DataError::InvalidNumericCell {
            row_key: row_key.to_string(),
            column: column.to_string(),
            value: raw.to_string(),
        })
    }
}

fn column_is_numeric(table: &Table, col: usize) -> bool {
    let (mut present, mut numeric) = (0usize, 0usize);
    for cell in table.column_values(col) {
        if is_missing(cell) {
            continue;
        }
        present += 1;
        if parse_numeric(cell).is_some() {
            numeric += 1;
        }
    }
    numeric > 0 && numeric as f64 / present as f64 >= NUMERIC_FRACTION
}

fn disambiguate<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut taken: BTreeSet<String> = BTreeSet::new();
    values
        .map(|v| {
            let mut key = v.to_string();
            let mut n = 2;
            while taken.contains(&key) {
                key = format!("{v}#{n}");
                n += 1;
            }
            taken.insert(key.clone());
            key
        })
        .collect()
}
