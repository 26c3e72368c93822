use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ClientConfig;
use crate::application::EngineSettings;
use crate::application::transfer::DEFAULT_CHUNK_SIZE;
use crate::utils::MAX_FILENAME_LENGTH;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "WORKDL_CONFIG";

pub const DEFAULT_WORK_TAG: &str = "download_work";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub download_dir: PathBuf,
    pub chunk_size: usize,
    pub max_file_name_length: usize,
    pub work_tag: String,
    pub notifications_enabled: bool,
    pub user_agent: String,
    pub connect_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from("downloads")),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_name_length: MAX_FILENAME_LENGTH,
            work_tag: DEFAULT_WORK_TAG.to_string(),
            notifications_enabled: true,
            user_agent: ClientConfig::default().user_agent,
            connect_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// `$WORKDL_CONFIG`, else `<config dir>/work-downloader/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("work-downloader").join("config.json")))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.chunk_size == 0 {
            self.chunk_size = DEFAULT_CHUNK_SIZE;
        }
        if self.max_file_name_length == 0 {
            self.max_file_name_length = MAX_FILENAME_LENGTH;
        }
        if self.work_tag.trim().is_empty() {
            self.work_tag = DEFAULT_WORK_TAG.to_string();
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone(),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            download_dir: self.download_dir.clone(),
            chunk_size: self.chunk_size,
        }
    }
}
