//! Domain models for the driver grid pipeline.
//!
//! - [`Cell`] - One value of an uploaded report
//! - [`RawTable`] - The parsed report, immutable once loaded
//! - [`AggregatedRow`] - Per-driver sums of the selected violation columns
//! - [`ResultRow`] - Final `Name / Violations / Violations Count` projection

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Cells
// =============================================================================

/// A single report value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Numeric value used by the row filter and the aggregator.
    ///
    /// Numbers pass through, text is parsed after trimming, everything else
    /// (absent, unparseable, NaN, infinite) counts as `0.0`. Malformed values
    /// are never an error here.
    pub fn coerce_number(&self) -> f64 {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Cell::Empty => 0.0,
        };
        if value.is_finite() { value } else { 0.0 }
    }

    /// Display form, trimmed. Integral numbers drop their fractional part.
    pub fn display(&self) -> String {
        match self {
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Render a number the way the output grid shows it.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// =============================================================================
// Raw Table
// =============================================================================

/// One report row, positionally aligned with [`RawTable::headers`].
pub type Row = Vec<Cell>;

/// A parsed report.
///
/// Headers are trimmed on construction. Blank headers become `column_<n>`.
/// When two headers trim to the same name the first one is used for lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Row>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let trimmed = h.trim();
                if trimmed.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    trimmed.to_string()
                }
            })
            .collect();

        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.clone()).or_insert(i);
        }

        Self { headers, index, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Value of `column` in `row`; absent columns and short rows read as empty.
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> &'a Cell {
        self.column_index(column)
            .and_then(|i| row.get(i))
            .unwrap_or(&EMPTY_CELL)
    }
}

// =============================================================================
// Aggregated / Result Rows
// =============================================================================

/// Per-driver sums, one entry per available column in declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub name: String,
    pub totals: Vec<(String, f64)>,
}

impl AggregatedRow {
    pub fn total(&self, column: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| *v)
    }
}

/// One line of the output grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub name: String,
    pub violations: String,
    pub violations_count: f64,
}
