//! Output workbook: the `Name / Violations / Violations Count` grid.
//!
//! ```text
//! ┌──────────────┬────────────────────────────┬──────────────────┐
//! │ Driver Name  │ Violations                 │ Violations Count │  ← #B8CCE4, bold
//! ├──────────────┼────────────────────────────┼──────────────────┤
//! │ Jane Doe     │ U Turn, Speeding Violations│        3         │
//! └──────────────┴────────────────────────────┴──────────────────┘
//! ```
//!
//! Every cell is centered and boxed with thin borders. Column widths follow
//! the longest value in each column.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use std::path::Path;

use crate::error::RenderError;
use crate::models::{format_number, ResultRow};

pub const SHEET_NAME: &str = "Extracted Data";
pub const VIOLATIONS_HEADER: &str = "Violations";
pub const COUNT_HEADER: &str = "Violations Count";
pub const HEADER_FILL: u32 = 0xB8CCE4;

/// A cell of the output grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridValue {
    Text(String),
    Number(f64),
}

impl GridValue {
    /// String form used for width computation.
    pub fn display(&self) -> String {
        match self {
            GridValue::Text(s) => s.clone(),
            GridValue::Number(n) => format_number(*n),
        }
    }
}

/// Everything the workbook will contain, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub header: Vec<String>,
    pub rows: Vec<Vec<GridValue>>,
    pub column_widths: Vec<f64>,
}

impl GridLayout {
    /// Lay out `rows` under a header whose first column is `name_label`.
    pub fn build(name_label: &str, rows: &[ResultRow]) -> Self {
        let header = vec![
            name_label.to_string(),
            VIOLATIONS_HEADER.to_string(),
            COUNT_HEADER.to_string(),
        ];
        let rows: Vec<Vec<GridValue>> = rows
            .iter()
            .map(|r| {
                vec![
                    GridValue::Text(r.name.clone()),
                    GridValue::Text(r.violations.clone()),
                    GridValue::Number(r.violations_count),
                ]
            })
            .collect();

        let column_widths = (0..header.len())
            .map(|col| {
                let longest = rows
                    .iter()
                    .map(|r| r[col].display().chars().count())
                    .chain(std::iter::once(header[col].chars().count()))
                    .max()
                    .unwrap_or(0);
                column_width(longest)
            })
            .collect();

        Self {
            header,
            rows,
            column_widths,
        }
    }
}

/// `(longest + 2) * 1.1`, rounded to two decimals.
pub fn column_width(longest: usize) -> f64 {
    (((longest + 2) as f64 * 1.1) * 100.0).round() / 100.0
}

/// Data cell style: thin box, centered both ways.
pub fn cell_format() -> Format {
    Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

/// Header style: the cell style plus bold text on the header fill.
pub fn header_format() -> Format {
    cell_format().set_bold().set_background_color(HEADER_FILL)
}

/// Serialize a layout to xlsx bytes.
pub fn render_layout(layout: &GridLayout) -> Result<Vec<u8>, RenderError> {
    let header_format = header_format();
    let cell_format = cell_format();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in layout.header.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title, &header_format)?;
    }

    for (i, row) in layout.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            match value {
                GridValue::Text(s) => {
                    sheet.write_string_with_format(r, col as u16, s, &cell_format)?;
                }
                GridValue::Number(n) => {
                    sheet.write_number_with_format(r, col as u16, *n, &cell_format)?;
                }
            }
        }
    }

    for (col, width) in layout.column_widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Build and serialize in one step.
pub fn render_workbook(name_label: &str, rows: &[ResultRow]) -> Result<Vec<u8>, RenderError> {
    render_layout(&GridLayout::build(name_label, rows))
}

/// `report.xlsx` → `report_grid.xlsx`; names without an extension get the suffix appended.
pub fn output_file_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("report");
    format!("{}_grid.xlsx", stem)
}
