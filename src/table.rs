//! Minimal in-memory table over the `csv` crate.
//!
//! Cells keep the text they were read with so that unchanged columns are
//! written back exactly as they came in.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::GradeError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Number(v) => Some(*v),
        }
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Number(v) => Cow::Owned(v.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Rows of cells under a fixed, ordered header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`], failing with
    /// [`GradeError::MissingColumn`] naming `source_name`.
    pub fn require_column(&self, name: &str, source_name: &str) -> Result<usize, GradeError> {
        self.column_index(name)
            .ok_or_else(|| GradeError::MissingColumn {
                column: name.to_string(),
                source_name: source_name.to_string(),
            })
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Appends a column; `values` holds one cell per existing row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Rewrites every cell of column `idx` in place.
    pub fn map_column(&mut self, idx: usize, f: impl Fn(&Cell) -> Cell) {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// New table with the same header holding the rows at `indices`, in order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Reads a headed CSV file. Header names are trimmed; cell text is kept.
    pub fn read_csv(path: &Path) -> Result<Table> {
        if !path.exists() {
            return Err(GradeError::MissingFile {
                path: path.to_path_buf(),
            }
            .into());
        }

        let file = File::open(path).with_context(|| format!("opening `{}`", path.display()))?;
        let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(file);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| malformed(path, &e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Table::new(columns);
        for result in rdr.records() {
            let record = result.map_err(|e| malformed(path, &e))?;
            table.push_row(record.iter().map(Cell::parse).collect());
        }

        debug!(path = %path.display(), rows = table.len(), "Read CSV");
        Ok(table)
    }

    /// Writes the table as CSV, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .from_path(path)
            .with_context(|| format!("creating `{}`", path.display()))?;

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_str().into_owned()))?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = self.len(), "Wrote CSV");
        Ok(())
    }
}

fn malformed(path: &Path, err: &csv::Error) -> GradeError {
    GradeError::MalformedRow {
        path: path.to_path_buf(),
        line: err.position().map(|p| p.line()).unwrap_or(0),
        reason: err.to_string(),
    }
}

/// A [`Table`] with a unique lookup key per row.
#[derive(Debug, Clone)]
pub struct KeyedTable {
    key_column: usize,
    table: Table,
    index: HashMap<String, usize>,
}

impl KeyedTable {
    /// Indexes `table` by `key`. Rows with an empty or repeated key are
    /// rejected as malformed rows of `path`.
    pub fn new(table: Table, key: &str, path: &Path) -> Result<Self, GradeError> {
        let key_column = table.require_column(key, &path.display().to_string())?;

        let mut index = HashMap::with_capacity(table.len());
        for (i, row) in table.rows().iter().enumerate() {
            // Header is line 1.
            let line = i as u64 + 2;
            let value = row[key_column].as_str().into_owned();
            if value.is_empty() {
                return Err(GradeError::MalformedRow {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("`{key}` is empty"),
                });
            }
            if index.insert(value.clone(), i).is_some() {
                return Err(GradeError::MalformedRow {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("duplicate `{key}` value `{value}`"),
                });
            }
        }

        Ok(Self {
            key_column,
            table,
            index,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn key_column(&self) -> usize {
        self.key_column
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[Cell]> {
        self.index.get(key).map(|&i| self.table.rows()[i].as_slice())
    }

    /// Keys in row order.
    pub fn keys(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.table.rows().iter().map(|r| r[self.key_column].as_str())
    }
}
