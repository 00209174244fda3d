// src/nwis/rdb.rs
// Parser for the USGS RDB format: '#' comment lines, a tab-separated header
// row, a column-definition row (e.g. "5s\t15s"), then tab-separated data.

use serde_json::Value;

use crate::error::NwisError;
use crate::table::Table;

/// Parse an RDB document into a [`Table`]. Empty cells become null; numeric
/// cells are parsed as numbers, everything else stays a string.
pub fn parse(body: &str) -> Result<Table, NwisError> {
    let mut lines = body.lines().filter(|line| !line.starts_with('#'));

    let header = lines
        .next()
        .ok_or_else(|| NwisError::Parse("RDB document has no header row".to_string()))?;
    let columns: Vec<String> = header.split('\t').map(|c| c.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(NwisError::Parse("RDB header row is empty".to_string()));
    }

    // Column-definition row ("5s", "15d", ...) carries widths, not data.
    let _dtypes = lines.next();

    let mut rows = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let mut row: Vec<Value> = line.split('\t').map(parse_cell).collect();
        // Ragged rows happen on truncated responses; pad so every row
        // matches the header width.
        row.resize(columns.len(), Value::Null);
        row.truncate(columns.len());
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    // Leading zeros are significant in USGS codes ("09380000", "00060");
    // only treat the cell as numeric when parsing round-trips.
    if let Ok(n) = trimmed.parse::<i64>() {
        if n.to_string() == trimmed {
            return Value::from(n);
        }
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() && trimmed.chars().any(|c| c == '.' || c == 'e' || c == 'E') {
            return Value::from(f);
        }
    }
    Value::String(trimmed.to_string())
}
