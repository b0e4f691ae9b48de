//! Configuration store adapter.
//!
//! Implements [`ConfigPort`] over an in-memory blob slot. The config is
//! kept as a `postcard` blob, the same encoding the firmware writes to its
//! flash partition, so a corrupted or truncated blob is detected on load
//! rather than half-applied.
//!
//! The dashboard's `config.json` document is a separate import/export
//! path ([`import_json`](MemoryConfigStore::import_json),
//! [`export_json`](MemoryConfigStore::export_json)) that goes through the
//! same validation.

use std::cell::RefCell;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::KilnConfig;

/// Largest blob accepted on load.
const MAX_BLOB_SIZE: usize = 512;

pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConfigStore {
    /// An empty store: the first load yields defaults.
    pub fn new() -> Self {
        Self {
            blob: RefCell::new(None),
        }
    }

    /// Validate and store a `config.json` document.
    pub fn import_json(&self, json: &str) -> Result<KilnConfig, ConfigError> {
        let config = KilnConfig::from_json(json)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Render the stored config (or defaults) as `config.json`.
    pub fn export_json(&self) -> Result<String, ConfigError> {
        self.load()?.to_json()
    }

    /// Replace the raw blob. Used to simulate flash corruption in tests.
    pub fn write_raw(&self, bytes: Vec<u8>) {
        *self.blob.borrow_mut() = Some(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.blob.borrow().is_none()
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<KilnConfig, ConfigError> {
        match self.blob.borrow().as_deref() {
            Some(bytes) if bytes.len() > MAX_BLOB_SIZE => {
                warn!("ConfigStore: blob of {} bytes exceeds limit", bytes.len());
                Err(ConfigError::Corrupted)
            }
            Some(bytes) => {
                let cfg: KilnConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("ConfigStore: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("ConfigStore: no stored config, using defaults");
                Ok(KilnConfig::default())
            }
        }
    }

    fn save(&self, config: &KilnConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("ConfigStore: config saved ({} bytes)", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}
