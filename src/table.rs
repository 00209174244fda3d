// src/table.rs
// Tabular results from the USGS services, plus the column sanitation every
// operation applies before serializing into an envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder string USGS uses for "no value" cells, distinct from a
/// structurally missing (null) cell.
pub const SENTINEL: &str = "-";

/// A two-dimensional result: named columns, one value per row, rows in
/// source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Empty means nothing usable survived: no rows, or no columns left
    /// after sanitation even when rows remain.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Remove columns that are entirely missing, then columns whose values
    /// are entirely the `"-"` sentinel. Surviving columns keep their order
    /// and names; row count, row order and surviving cells are untouched.
    pub fn sanitize(&mut self) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|col| {
                self.rows
                    .iter()
                    .any(|row| match row.get(col) {
                        Some(Value::Null) | None => false,
                        Some(Value::String(s)) => s != SENTINEL,
                        Some(_) => true,
                    })
            })
            .collect();

        if keep.iter().all(|&k| k) {
            return;
        }

        self.columns = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(name, _)| name.clone())
            .collect();

        for row in &mut self.rows {
            let mut col = 0;
            row.retain(|_| {
                let k = keep.get(col).copied().unwrap_or(false);
                col += 1;
                k
            });
        }
    }

    /// Drop the named columns wherever they exist; unknown names are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();

        if keep.iter().all(|&k| k) {
            return;
        }

        self.columns = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(name, _)| name.clone())
            .collect();

        for row in &mut self.rows {
            let mut col = 0;
            row.retain(|_| {
                let k = keep.get(col).copied().unwrap_or(false);
                col += 1;
                k
            });
        }
    }
}
