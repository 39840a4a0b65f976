use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ConfigError;

pub const DEFAULT_PRELIMS_QUESTIONS: u32 = 100;
pub const DEFAULT_PRELIMS_MINUTES: u32 = 120;
pub const DEFAULT_ESSAY_MINUTES: u32 = 180;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Display name; the key is absent from the file when cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub prelims_questions: u32,
    pub prelims_minutes: u32,
    pub essay_minutes: u32,
    pub tick_interval_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            prelims_questions: DEFAULT_PRELIMS_QUESTIONS,
            prelims_minutes: DEFAULT_PRELIMS_MINUTES,
            essay_minutes: DEFAULT_ESSAY_MINUTES,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            log_level: "info".to_string(),
        }
    }
}

pub trait ConfigStore {
    /// Read the stored config. A missing store yields the defaults; an
    /// unreadable one is an error.
    fn try_load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;

    /// Like [`ConfigStore::try_load`], falling back to the defaults.
    fn load(&self) -> Config {
        self.try_load().unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring unreadable config");
            Config::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "chronomaster") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("chronomaster_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn try_load(&self) -> Result<Config, ConfigError> {
        let Ok(bytes) = fs::read(&self.path) else {
            return Ok(Config::default());
        };
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(cfg)?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.path, data)
        };
        write().map_err(|source| ConfigError::SaveFailed {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store. Clones share the same config.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<Config>>,
}

impl MemoryConfigStore {
    pub fn new(cfg: Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cfg)),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn try_load(&self) -> Result<Config, ConfigError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = cfg.clone();
        Ok(())
    }
}
