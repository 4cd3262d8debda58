//! Column catalog, per-request selection, and schema resolution.

pub mod catalog;
pub mod resolver;
pub mod selection;

pub use catalog::{CatalogColumn, ColumnCatalog, ColumnGroup};
pub use resolver::{resolve, ResolvedSchema};
pub use selection::Selection;
