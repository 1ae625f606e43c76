//! Uniform named-column tables

use std::collections::HashSet;

use serde::Serialize;

use crate::error::AssemblyError;
use crate::extractors::{Record, TableGrid};

/// Columns with unique names and rows of exactly one value per column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tabular {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn ensure_unique(columns: &[String]) -> Result<(), AssemblyError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(AssemblyError::DuplicateColumn(column.clone()));
        }
    }
    Ok(())
}

impl Tabular {
    /// Rows from records, columns exactly as declared by the caller
    pub fn from_records<S: AsRef<str>>(
        records: &[Record],
        column_order: &[S],
    ) -> Result<Self, AssemblyError> {
        let columns: Vec<String> = column_order.iter().map(|c| c.as_ref().to_string()).collect();
        ensure_unique(&columns)?;

        let rows = records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                columns
                    .iter()
                    .map(|column| {
                        record.get(column).map(String::from).ok_or_else(|| {
                            AssemblyError::MissingValue {
                                row,
                                column: column.clone(),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns, rows })
    }

    /// Promote the first non-empty grid row to column names. Cell-less rows
    /// before it are skipped. Short rows are padded with empty strings, long
    /// rows truncated.
    pub fn from_grid(grid: TableGrid) -> Result<Self, AssemblyError> {
        let mut rows = grid.rows.into_iter().skip_while(|row| row.is_empty());
        let columns = rows.next().ok_or(AssemblyError::EmptyGrid)?;
        ensure_unique(&columns)?;

        let width = columns.len();
        let rows = rows
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` under `column`
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }
}
