//! Configuration loading for Trellis.
//!
//! A [`ConfigSet`] maps configuration files in one directory to keys
//! in the application context: each file is parsed by extension
//! (JSON, TOML or env format) and its value stored under the mapped
//! key, where services read it at construction time.

pub mod error;
pub mod format;

pub use error::{ConfigError, Result};
pub use format::FileFormat;

use std::fs;
use std::path::PathBuf;
use tracing::debug;
use trellis_core::AppContext;

/// A config directory plus an ordered file-to-key map.
pub struct ConfigSet {
    dir: PathBuf,
    files: Vec<(String, String)>,
}

impl ConfigSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
        }
    }

    /// Map a file in the config directory to a context key.
    pub fn file(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.files.push((name.into(), key.into()));
        self
    }

    /// Load every mapped file into the context, in declaration order.
    pub fn load_into(&self, context: &AppContext) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(ConfigError::DirectoryNotFound(
                self.dir.display().to_string(),
            ));
        }

        for (name, key) in &self.files {
            let path = self.dir.join(name);
            let format = FileFormat::detect(&path)?;
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
                file: path.display().to_string(),
                source,
            })?;
            let value = format.parse(&path, &content)?;
            debug!(file = %path.display(), key = %key, "Loaded configuration file");
            context.set(key.clone(), value);
        }

        Ok(())
    }
}
