use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub youtube_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Caption scraping depends on an undocumented page layout; flip this off
    /// to run metadata-only without touching the rest of the pipeline.
    #[serde(default = "default_transcripts_enabled")]
    pub transcripts_enabled: bool,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playlist-digest");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("playlists.db").to_string_lossy().to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_transcripts_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            youtube_api_key: None,
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            transcripts_enabled: default_transcripts_enabled(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config: Config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        // API keys may live in the environment instead of the config file
        if config.youtube_api_key.is_none() {
            config.youtube_api_key = std::env::var("YOUTUBE_API_KEY").ok();
        }
        if config.gemini_api_key.is_none() {
            config.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playlist-digest")
            .join("config.toml")
    }
}
