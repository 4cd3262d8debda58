//! Keep only rows that record at least one violation.

use crate::models::{RawTable, Row};

/// Rows where any of `columns`, coerced with [`crate::models::Cell::coerce_number`],
/// is strictly positive. Input order is preserved.
pub fn filter_rows<'a>(table: &'a RawTable, columns: &[String]) -> Vec<&'a Row> {
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    table
        .rows()
        .iter()
        .filter(|row| {
            indices.iter().any(|&i| {
                row.get(i).map(|cell| cell.coerce_number()).unwrap_or(0.0) > 0.0
            })
        })
        .collect()
}
