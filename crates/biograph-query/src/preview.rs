//! Aligned text rendering of result rows.

use biograph_core::Record;
use serde_json::Value;

/// Union of column names across records, in first-seen order.
pub fn columns(records: &[Record]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !out.iter().any(|c| c == column) {
                out.push(column.to_string());
            }
        }
    }
    out
}

/// Text form of a cell. Nulls (unmatched optional joins) render empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a header line plus at most `limit` rows, each column padded to its
/// widest cell and separated by two spaces.
pub fn render_table(columns: &[String], records: &[Record], limit: usize) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .take(limit)
        .map(|r| {
            columns
                .iter()
                .map(|c| r.get(c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns.to_vec();
    std::iter::once(&header)
        .chain(rows.iter())
        .map(|cells| format_line(cells, &widths))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}
