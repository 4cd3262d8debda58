//! Per-request choice of violation columns and label mode.

use serde::Serialize;

use super::catalog::{ColumnCatalog, ColumnGroup};
use crate::error::{SchemaError, SchemaResult};

/// Validated column selection for one run.
///
/// Columns are deduplicated and kept in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    columns: Vec<String>,
    individual_count: bool,
}

impl Selection {
    /// Build a selection from form input.
    ///
    /// `harsh_handling` adds every harsh-handling column. When neither
    /// names nor the harsh toggle are given, the whole default group is used.
    /// Names outside the catalog are rejected.
    pub fn new(
        catalog: &ColumnCatalog,
        requested: &[String],
        harsh_handling: bool,
        individual_count: bool,
    ) -> SchemaResult<Self> {
        let mut chosen: Vec<String> = Vec::new();

        for name in requested {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if !catalog.contains(name) {
                return Err(SchemaError::UnknownColumn(name.to_string()));
            }
            chosen.push(name.to_string());
        }

        if harsh_handling {
            chosen.extend(catalog.group(ColumnGroup::HarshHandling));
        }
        if chosen.is_empty() {
            chosen = catalog.group(ColumnGroup::Default);
        }

        let columns = catalog
            .columns()
            .iter()
            .filter(|c| chosen.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();

        Ok(Self {
            columns,
            individual_count,
        })
    }

    /// Default group, plain labels.
    pub fn defaults(catalog: &ColumnCatalog) -> Self {
        Self {
            columns: catalog.group(ColumnGroup::Default),
            individual_count: false,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn individual_count(&self) -> bool {
        self.individual_count
    }
}
