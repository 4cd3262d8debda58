//! Runtime configuration, read from the environment (and `.env`).
//!
//! | Variable                       | Default                   |
//! |--------------------------------|---------------------------|
//! | `PORT`                         | `3000`                    |
//! | `DRIVER_GRID_STORAGE_DIR`      | `.driver-grid/artifacts`  |
//! | `DRIVER_GRID_MAX_UPLOAD_MB`    | `20`                      |
//! | `DRIVER_GRID_METADATA_LINES`   | `10`                      |

use std::path::PathBuf;

use crate::parser::DEFAULT_METADATA_LINES;
use crate::storage::DEFAULT_STORAGE_DIR;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub metadata_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            metadata_lines: DEFAULT_METADATA_LINES,
        }
    }
}

impl AppConfig {
    /// Read from process environment. Unset or unparseable values keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`, so tests need not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        Self {
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            storage_dir: lookup("DRIVER_GRID_STORAGE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            max_upload_bytes: parsed("DRIVER_GRID_MAX_UPLOAD_MB")
                .and_then(|mb| mb.checked_mul(1024 * 1024))
                .unwrap_or(defaults.max_upload_bytes),
            metadata_lines: parsed("DRIVER_GRID_METADATA_LINES")
                .unwrap_or(defaults.metadata_lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.metadata_lines, 10);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DRIVER_GRID_STORAGE_DIR", "/tmp/grids"),
            ("DRIVER_GRID_MAX_UPLOAD_MB", "5"),
            ("DRIVER_GRID_METADATA_LINES", "0"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/grids"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.metadata_lines, 0);
    }

    #[test]
    fn test_garbage_keeps_default() {
        let config = AppConfig::from_lookup(lookup(&[("PORT", "eighty"), ("DRIVER_GRID_MAX_UPLOAD_MB", "-1")]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_MB * 1024 * 1024);
    }

    #[test]
    fn test_oversized_upload_limit_keeps_default() {
        let huge = usize::MAX.to_string();
        let config = AppConfig::from_lookup(lookup(&[("DRIVER_GRID_MAX_UPLOAD_MB", huge.as_str())]));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_MB * 1024 * 1024);
    }
}
