//! Violation label and count for each driver.

use crate::models::{AggregatedRow, ResultRow};

/// Label and count for one aggregated row.
///
/// Only columns with a positive total contribute, in the order they appear in
/// `row.totals` (declared catalog order). With `individual_count` each label
/// entry carries its total rounded to an integer, e.g. `"U Turn (2)"`.
pub fn derive_row(row: &AggregatedRow, individual_count: bool) -> ResultRow {
    let positive: Vec<(&str, f64)> = row
        .totals
        .iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(column, value)| (column.as_str(), *value))
        .collect();

    let violations = positive
        .iter()
        .map(|(column, value)| {
            if individual_count {
                format!("{} ({})", column, value.round() as i64)
            } else {
                column.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    ResultRow {
        name: row.name.clone(),
        violations,
        violations_count: positive.iter().map(|(_, v)| v).sum(),
    }
}

pub fn derive_rows(rows: &[AggregatedRow], individual_count: bool) -> Vec<ResultRow> {
    rows.iter()
        .map(|row| derive_row(row, individual_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, totals: &[(&str, f64)]) -> AggregatedRow {
        AggregatedRow {
            name: name.to_string(),
            totals: totals.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_plain_label() {
        let r = derive_row(&row("A", &[("Speeding", 2.0), ("U Turn", 1.0)]), false);
        assert_eq!(r.violations, "Speeding, U Turn");
        assert_eq!(r.violations_count, 3.0);
    }

    #[test]
    fn test_individual_count_label() {
        let aggregated = row("A", &[("Speeding", 2.0), ("U Turn", 1.0)]);
        let plain = derive_row(&aggregated, false);
        let counted = derive_row(&aggregated, true);
        assert_eq!(counted.violations, "Speeding (2), U Turn (1)");
        assert_eq!(counted.violations_count, plain.violations_count);
    }

    #[test]
    fn test_non_positive_excluded_from_label_and_count() {
        let r = derive_row(
            &row("A", &[("Speeding", 0.0), ("U Turn", 2.0), ("Hard Turn", -1.0), ("High G", 1.0)]),
            false,
        );
        assert_eq!(r.violations, "U Turn, High G");
        assert_eq!(r.violations_count, 3.0);
    }

    #[test]
    fn test_all_zero_row() {
        let r = derive_row(&row("A", &[("Speeding", 0.0)]), true);
        assert_eq!(r.violations, "");
        assert_eq!(r.violations_count, 0.0);
    }

    #[test]
    fn test_fractional_totals_rounded_in_label_only() {
        let r = derive_row(&row("A", &[("Speeding", 1.6)]), true);
        assert_eq!(r.violations, "Speeding (2)");
        assert_eq!(r.violations_count, 1.6);
    }
}
