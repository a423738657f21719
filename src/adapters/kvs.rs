//! File-backed key-value store.
//!
//! Implements both [`StoragePort`] and [`ConfigPort`]. Each key is one file
//! in the store directory; the configuration lives under
//! [`CONFIG_KEY`] as a short-key JSON record.
//!
//! - Config validation: every field is range-checked on load and before
//!   persistence. Invalid records are rejected, not clamped.
//! - Atomic writes: values are written to a temporary file and renamed.
//! - First run: a missing config record is created from defaults.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::NamedTempFile;

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SaunaConfig;

/// Key holding the serialized [`SaunaConfig`].
pub const CONFIG_KEY: &str = "SaunaConfig";

/// Largest value the store accepts.
const MAX_VALUE_SIZE: usize = 4096;
const MAX_KEY_LEN: usize = 64;

pub struct KvsStore {
    dir: PathBuf,
}

impl KvsStore {
    /// Open the store, creating its directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|_| StorageError::IoError)?;
        info!("KvsStore: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key.len() <= MAX_KEY_LEN
            && !key.starts_with('.')
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        if !valid {
            return Err(StorageError::InvalidKey);
        }
        Ok(self.dir.join(key))
    }

    fn read_value(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::IoError,
        })
    }

    fn write_value(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_VALUE_SIZE {
            return Err(StorageError::BufferTooSmall);
        }
        let path = self.path_for(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|_| StorageError::IoError)?;
        tmp.write_all(data).map_err(|_| StorageError::IoError)?;
        tmp.persist(&path).map_err(|_| StorageError::IoError)?;
        Ok(())
    }
}

impl StoragePort for KvsStore {
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self.read_value(key)?;
        if data.len() > buf.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.write_value(key, data)
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_ok_and(|p| p.is_file())
    }
}

impl ConfigPort for KvsStore {
    fn load(&self) -> Result<SaunaConfig, ConfigError> {
        let bytes = match self.read_value(CONFIG_KEY) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound) => {
                info!("KvsStore: no stored config, writing defaults");
                let cfg = SaunaConfig::default();
                if let Err(e) = self.save(&cfg) {
                    warn!("KvsStore: could not persist defaults: {}", e);
                }
                return Ok(cfg);
            }
            Err(_) => return Err(ConfigError::IoError),
        };

        let cfg: SaunaConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("KvsStore: loaded config (v{})", cfg.version);
        Ok(cfg)
    }

    fn save(&self, config: &SaunaConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_vec(config).map_err(|_| ConfigError::Corrupted)?;
        self.write_value(CONFIG_KEY, &json)
            .map_err(|_| ConfigError::IoError)
    }
}
