//! Configuration handling for PromptForge.
//! This module provides functionality for loading application settings
//! with support for JSON and YAML formats.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported configuration file names
pub const CONFIG_FILES: [&str; 3] =
    ["promptforge.json", "promptforge.yml", "promptforge.yaml"];

/// Environment variable consulted when no API key is configured.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend used when the caller names none
    pub default_backend: Option<String>,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_base_url: String,
    pub lmstudio_base_url: String,
    /// Proxy applied to every connector client
    pub proxy_url: Option<String>,
    /// Label exposed to templates as `{{ user }}`
    pub user_label: String,
    /// Location of the prompt/history record store
    pub store_path: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_backend: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            lmstudio_base_url: "http://localhost:1234/v1".to_string(),
            proxy_url: None,
            user_label: "User".to_string(),
            store_path: PathBuf::from("promptforge-store.json"),
            request_timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Returns the OpenAI API key: the configured one, or the
    /// `OPENAI_API_KEY` environment variable as fallback.
    pub fn api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok())
    }
}

/// Loads settings from a directory, trying multiple file formats.
/// Supports: promptforge.json, promptforge.yml, promptforge.yaml
///
/// A missing configuration file is not an error; defaults apply.
pub fn load_settings<P: AsRef<Path>>(config_dir: P) -> Result<Settings> {
    for file in CONFIG_FILES {
        let config_path = config_dir.as_ref().join(file);
        if config_path.exists() {
            debug!("Loading configuration from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path).map_err(Error::IoError)?;
            return parse_settings(&content);
        }
    }

    debug!("No configuration file found (tried: {}); using defaults", CONFIG_FILES.join(", "));
    Ok(Settings::default())
}

/// Parses settings content, trying JSON first and YAML as fallback.
pub fn parse_settings(content: &str) -> Result<Settings> {
    match serde_json::from_str(content) {
        Ok(settings) => Ok(settings),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {}", e))),
    }
}
