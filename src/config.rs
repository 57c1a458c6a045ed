use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "GREENCITY_CONFIG";
pub const API_URL_ENV: &str = "GREENCITY_API_URL";
pub const DEFAULT_CONFIG_FILE: &str = "greencity.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables of the mini-game. Distances are in city units (one grid cell is
/// `cell_size` units wide).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub duration_secs: u32,
    pub target_score: u32,
    pub grid_size: i32,
    pub cell_size: f32,
    pub pick_radius: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: 120,
            target_score: 100,
            grid_size: 12,
            cell_size: 2.0,
            pick_radius: 1.5,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::Invalid { field: "game.duration_secs", reason: "must be positive".into() });
        }
        if self.target_score == 0 {
            return Err(ConfigError::Invalid { field: "game.target_score", reason: "must be positive".into() });
        }
        if self.grid_size <= 0 || self.grid_size % 2 != 0 {
            return Err(ConfigError::Invalid {
                field: "game.grid_size",
                reason: format!("expected a positive even number, got {}", self.grid_size),
            });
        }
        if !(self.cell_size > 0.0) {
            return Err(ConfigError::Invalid { field: "game.cell_size", reason: "must be positive".into() });
        }
        if !(self.pick_radius > 0.0) {
            return Err(ConfigError::Invalid { field: "game.pick_radius", reason: "must be positive".into() });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub token_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            token_path: PathBuf::from(".greencity_token"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Loads `$GREENCITY_CONFIG` or `./greencity.toml` when present, falling
    /// back to defaults, then applies `$GREENCITY_API_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api.base_url = url;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "api.base_url", reason: "must not be empty".into() });
        }
        Ok(())
    }
}
