//! Directory-of-JSON-files storage adapter: one `<key>.json` per slot.

use crate::domain::config_validation::DEFAULT_DATA_DIR;
use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use crate::ports::storage_port::StoragePort;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct JsonFileAdapter {
    base_path: PathBuf,
}

impl JsonFileAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Uses `[storage] dir`, falling back to `journal-data` in the working
    /// directory.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let dir = config
            .get_string("storage", "dir")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(dir)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn storage_error(key: &str, path: &Path, e: std::io::Error) -> JournalError {
        JournalError::Storage {
            key: key.to_string(),
            reason: format!("{}: {}", path.display(), e),
        }
    }
}

impl StoragePort for JsonFileAdapter {
    fn read(&self, key: &str) -> Result<Option<String>, JournalError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::storage_error(key, &path, e)),
        }
    }

    /// Writes to a sibling temp file and renames it over the slot, so a
    /// crash mid-write leaves the previous payload intact.
    fn write(&self, key: &str, payload: &str) -> Result<(), JournalError> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| Self::storage_error(key, &self.base_path, e))?;

        let path = self.slot_path(key);
        let tmp = self.base_path.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, payload).map_err(|e| Self::storage_error(key, &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Self::storage_error(key, &path, e)
        })
    }
}
