//! Data directory resolution.

use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Overrides the data directory, mainly for tests and scripted use.
pub const DATA_DIR_ENV: &str = "NEXUS_DATA_DIR";

pub const DB_FILE: &str = "nexus.db";

fn default_base_dir() -> PathBuf {
    dirs_home().join(".nexus")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Explicit path first, then `NEXUS_DATA_DIR`, then `~/.nexus`.
pub fn resolve_base_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default_base_dir(),
    }
}

/// Create `base` if needed and open the database inside it.
pub fn open_data_dir(base: &Path) -> Result<Store> {
    fs::create_dir_all(base).map_err(|source| StoreError::Io {
        path: base.display().to_string(),
        source,
    })?;
    Store::open(&base.join(DB_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let dir = Path::new("/tmp/somewhere");
        assert_eq!(resolve_base_dir(Some(dir)), dir.to_path_buf());
    }

    #[test]
    fn test_open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("nested/data");
        let store = open_data_dir(&base).unwrap();
        store.set_value("k", "v").unwrap();
        assert!(base.join(DB_FILE).exists());
    }
}
