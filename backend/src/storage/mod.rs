//! Artifact store - request-scoped persistence of output workbooks.
//!
//! Each artifact lives in its own directory named by a fresh UUID, so two
//! uploads with the same file name never overwrite each other:
//!
//! ```text
//! <root>/
//!   3f2b…-…/daily_grid.xlsx
//!   a91c…-…/daily_grid.xlsx
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Directory where artifacts are stored (relative to current dir)
pub const DEFAULT_STORAGE_DIR: &str = ".driver-grid/artifacts";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// Handle to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactId {
    pub id: String,
    pub file_name: String,
}

impl ArtifactId {
    /// `<id>/<file_name>`, as used in download URLs.
    pub fn key(&self) -> String {
        format!("{}/{}", self.id, self.file_name)
    }
}

/// Filesystem-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_STORAGE_DIR)
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            root: dir.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a new unique id.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> StorageResult<ArtifactId> {
        let file_name = sanitize_file_name(file_name);
        let id = Uuid::new_v4().to_string();

        let dir = self.root.join(&id);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(&file_name), bytes)?;

        Ok(ArtifactId { id, file_name })
    }

    /// Read an artifact back verbatim.
    pub fn load(&self, id: &str, file_name: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(id, file_name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{}/{}", id, file_name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an artifact and its directory.
    pub fn delete(&self, id: &str, file_name: &str) -> StorageResult<()> {
        let path = self.path_for(id, file_name)?;
        if !path.exists() {
            return Err(StorageError::NotFound(format!("{}/{}", id, file_name)));
        }
        fs::remove_file(&path)?;
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir(dir);
        }
        Ok(())
    }

    /// Only paths this store could have issued are accepted.
    fn path_for(&self, id: &str, file_name: &str) -> StorageResult<PathBuf> {
        if Uuid::parse_str(id).is_err() {
            return Err(StorageError::InvalidName(id.to_string()));
        }
        if file_name.is_empty() || sanitize_file_name(file_name) != file_name {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(self.root.join(id).join(file_name))
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep a file name to `[A-Za-z0-9._-]`, with no leading dots.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "artifact".to_string()
    } else {
        cleaned.to_string()
    }
}
