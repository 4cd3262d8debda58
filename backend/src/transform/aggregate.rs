//! Group filtered report rows into one row per driver.
//!
//! # Architecture
//!
//! ```text
//! Filtered rows                        →  Aggregated rows
//! ┌───────────────────────────────┐      ┌──────────────────────────┐
//! │ Name: A, Speeding: 2, U: 0    │      │ A  Speeding: 5, U: 1     │
//! │ Name: B, Speeding: 0, U: 1    │  →   ├──────────────────────────┤
//! │ Name: A, Speeding: 3, U: 1    │      │ B  Speeding: 0, U: 1     │
//! └───────────────────────────────┘      └──────────────────────────┘
//! ```
//!
//! Drivers come out in order of first appearance.

use std::collections::HashMap;

use crate::models::{AggregatedRow, RawTable, Row};

/// Aggregation output plus the rows that had no driver name.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    /// Rows dropped because their trimmed name was empty.
    pub skipped_unnamed: usize,
}

/// Sum `columns` per distinct trimmed value of `name_column`.
pub fn aggregate(
    table: &RawTable,
    rows: &[&Row],
    name_column: &str,
    columns: &[String],
) -> Aggregation {
    let mut order: Vec<DriverTotals> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut skipped_unnamed = 0;

    for row in rows {
        let name = table.value(row, name_column).display();
        if name.is_empty() {
            skipped_unnamed += 1;
            continue;
        }

        let slot = *positions.entry(name.clone()).or_insert_with(|| {
            order.push(DriverTotals::new(name, columns.len()));
            order.len() - 1
        });
        order[slot].add_row(table, row, columns);
    }

    Aggregation {
        rows: order.into_iter().map(|d| d.build(columns)).collect(),
        skipped_unnamed,
    }
}

/// Running sums for one driver.
struct DriverTotals {
    name: String,
    sums: Vec<f64>,
}

impl DriverTotals {
    fn new(name: String, width: usize) -> Self {
        Self {
            name,
            sums: vec![0.0; width],
        }
    }

    fn add_row(&mut self, table: &RawTable, row: &Row, columns: &[String]) {
        for (sum, column) in self.sums.iter_mut().zip(columns) {
            *sum += table.value(row, column).coerce_number();
        }
    }

    fn build(self, columns: &[String]) -> AggregatedRow {
        AggregatedRow {
            name: self.name,
            totals: columns.iter().cloned().zip(self.sums).collect(),
        }
    }
}
