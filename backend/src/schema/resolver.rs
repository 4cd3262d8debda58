//! Matches a selection against the columns an upload actually has.

use serde::Serialize;

use super::catalog::ColumnCatalog;
use super::selection::Selection;
use crate::error::{SchemaError, SchemaResult};
use crate::models::RawTable;

/// Columns one run will work with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSchema {
    /// Header used to group rows by driver.
    pub name_column: String,
    /// Selected and present, in declared order.
    pub available_columns: Vec<String>,
    /// Selected but absent. Reported, not fatal.
    pub missing_columns: Vec<String>,
}

/// Resolve `selection` against `table`'s (trimmed) headers.
///
/// Fails when no selected column is present or when the table has none of
/// the catalog's name aliases.
pub fn resolve(
    catalog: &ColumnCatalog,
    table: &RawTable,
    selection: &Selection,
) -> SchemaResult<ResolvedSchema> {
    let (available_columns, missing_columns): (Vec<String>, Vec<String>) = selection
        .columns()
        .iter()
        .cloned()
        .partition(|c| table.has_column(c));

    if available_columns.is_empty() {
        return Err(SchemaError::NoViolationColumns {
            missing: missing_columns,
        });
    }

    let name_column = catalog
        .name_aliases()
        .iter()
        .find(|alias| table.has_column(alias))
        .cloned()
        .ok_or_else(|| SchemaError::NoIdentityColumn {
            aliases: catalog.name_aliases().to_vec(),
        })?;

    Ok(ResolvedSchema {
        name_column,
        available_columns,
        missing_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> RawTable {
        RawTable::new(headers.iter().map(|s| s.to_string()).collect(), vec![])
    }

    fn select(catalog: &ColumnCatalog, columns: &[&str]) -> Selection {
        let requested: Vec<String> = columns.iter().map(|s| s.to_string()).collect();
        Selection::new(catalog, &requested, false, false).unwrap()
    }

    #[test]
    fn test_all_present() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn", "Sign Violations"]);
        let resolved = resolve(&catalog, &table(&["Name", "Sign Violations", "U Turn"]), &selection).unwrap();
        assert_eq!(resolved.name_column, "Name");
        assert_eq!(resolved.available_columns, ["U Turn", "Sign Violations"]);
        assert!(resolved.missing_columns.is_empty());
    }

    #[test]
    fn test_partial_columns_reported_missing() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn", "Speeding Violations", "Hard Turn"]);
        let resolved = resolve(&catalog, &table(&["Driver Name", "U Turn"]), &selection).unwrap();
        assert_eq!(resolved.available_columns, ["U Turn"]);
        assert_eq!(resolved.missing_columns, ["Speeding Violations", "Hard Turn"]);
    }

    #[test]
    fn test_all_selected_missing_is_error() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn"]);
        let err = resolve(&catalog, &table(&["Name", "Speeding Violations"]), &selection).unwrap_err();
        assert_eq!(
            err,
            SchemaError::NoViolationColumns {
                missing: vec!["U Turn".into()]
            }
        );
    }

    #[test]
    fn test_identity_fallback_to_name() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn"]);
        let resolved = resolve(&catalog, &table(&["Name", "U Turn"]), &selection).unwrap();
        assert_eq!(resolved.name_column, "Name");
    }

    #[test]
    fn test_identity_prefers_driver_name() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn"]);
        let resolved = resolve(&catalog, &table(&["Name", "U Turn", "Driver Name"]), &selection).unwrap();
        assert_eq!(resolved.name_column, "Driver Name");
    }

    #[test]
    fn test_no_identity_column() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn"]);
        let err = resolve(&catalog, &table(&["Driver", "U Turn"]), &selection).unwrap_err();
        assert!(matches!(err, SchemaError::NoIdentityColumn { .. }));
    }

    #[test]
    fn test_headers_with_whitespace_resolve() {
        let catalog = ColumnCatalog::builtin();
        let selection = select(&catalog, &["U Turn"]);
        let resolved = resolve(&catalog, &table(&[" Driver Name", "U Turn  "]), &selection).unwrap();
        assert_eq!(resolved.name_column, "Driver Name");
        assert_eq!(resolved.available_columns, ["U Turn"]);
    }
}
