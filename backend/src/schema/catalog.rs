//! The catalog of recognised violation columns.
//!
//! Declared order matters: violation labels list columns in catalog order,
//! never in upload or selection order.

use serde::Serialize;

/// Groups the upload form offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnGroup {
    /// Always offered, used when nothing is selected.
    Default,
    /// Toggled as a unit.
    HarshHandling,
    Additional,
}

/// A recognised violation column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogColumn {
    pub name: String,
    pub group: ColumnGroup,
}

const DEFAULT_COLUMNS: &[&str] = &[
    "Following Distance",
    "Camera Obstruction",
    "U Turn",
    "Driver Distraction",
    "Seatbelt Compliance",
    "Sign Violations",
    "Speeding Violations",
    "Traffic Light Violation",
];

const HARSH_HANDLING_COLUMNS: &[&str] = &["Hard Braking", "Hard Acceleration", "Hard Turn"];

const ADDITIONAL_COLUMNS: &[&str] = &[
    "High G",
    "Low Impact",
    "Forward Collision Warning",
    "Roll Stop",
    "Drowsiness",
];

const NAME_ALIASES: &[&str] = &["Driver Name", "Name"];

/// Immutable set of violation columns and name-column aliases.
///
/// Passed into the resolver by value or reference; nothing reads a global.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCatalog {
    columns: Vec<CatalogColumn>,
    name_aliases: Vec<String>,
}

impl ColumnCatalog {
    /// Build a catalog. Column order is the declared order; aliases are
    /// tried first to last.
    pub fn new(columns: Vec<CatalogColumn>, name_aliases: Vec<String>) -> Self {
        Self {
            columns,
            name_aliases,
        }
    }

    /// The report layout exported by the fleet safety portal.
    pub fn builtin() -> Self {
        let groups = [
            (ColumnGroup::Default, DEFAULT_COLUMNS),
            (ColumnGroup::HarshHandling, HARSH_HANDLING_COLUMNS),
            (ColumnGroup::Additional, ADDITIONAL_COLUMNS),
        ];
        let columns = groups
            .iter()
            .flat_map(|(group, names)| {
                names.iter().map(move |name| CatalogColumn {
                    name: name.to_string(),
                    group: *group,
                })
            })
            .collect();

        Self::new(
            columns,
            NAME_ALIASES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn columns(&self) -> &[CatalogColumn] {
        &self.columns
    }

    pub fn name_aliases(&self) -> &[String] {
        &self.name_aliases
    }

    /// Column names of one group, in declared order.
    pub fn group(&self, group: ColumnGroup) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.group == group)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

impl Default for ColumnCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
