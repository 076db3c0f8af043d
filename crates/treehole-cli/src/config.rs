//! CLI configuration file support
//!
//! Loads configuration from ~/.config/treehole/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default settings
    #[serde(default)]
    pub default: DefaultConfig,
    /// API key settings
    #[serde(default)]
    pub api_keys: ApiKeysConfig,
}

/// Default configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Default model
    pub model: Option<String>,
    /// Chat completions base URL
    pub base_url: Option<String>,
    /// Card feed base URL
    pub cards_url: Option<String>,
    /// System prompt override
    pub system_prompt: Option<String>,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    /// DeepSeek-compatible API key
    pub deepseek: Option<String>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("treehole").join("config.toml"))
    }

    /// Apply the configured API key to the environment
    ///
    /// # Safety
    /// This modifies environment variables which can cause issues in multi-threaded contexts.
    /// Should only be called early in main() before spawning threads.
    pub fn apply_api_key_env(&self) {
        if let Some(key) = &self.api_keys.deepseek {
            if std::env::var("DEEPSEEK_API_KEY").is_err() {
                // SAFETY: Called early in main() before spawning threads
                unsafe { std::env::set_var("DEEPSEEK_API_KEY", key) };
            }
        }
    }
}

/// Data directory for logs, created on demand
pub fn ensure_data_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("No data directory available"))?
        .join("treehole");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
