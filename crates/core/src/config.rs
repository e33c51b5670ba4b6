use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// Run the browser without a visible window.
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Use an isolated, throwaway browsing context.
    #[serde(default = "default_incognito")]
    pub incognito: bool,
    /// Persistent profile directory. When set, incognito isolation is skipped.
    #[serde(default)]
    pub profile: Option<String>,
    /// Browser executable path (auto-detect if None).
    #[serde(default)]
    pub chrome_path: Option<String>,
    /// Chrome version token embedded in the spoofed user agent.
    #[serde(default)]
    pub chrome_version: Option<String>,
}

fn default_headless() -> bool {
    true
}

fn default_incognito() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            incognito: default_incognito(),
            profile: None,
            chrome_path: None,
            chrome_version: None,
        }
    }
}

/// Defaults handed to the external agent framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub agent: AgentDefaults,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_headless_incognito() {
        let config = Config::default();
        assert!(config.browser.headless);
        assert!(config.browser.incognito);
        assert!(config.browser.profile.is_none());
        assert_eq!(config.agent.model, "gemini-1.5-pro");
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.browser.headless = false;
        config.browser.chrome_version = Some("140.0.1.1".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(!loaded.browser.headless);
        assert_eq!(loaded.browser.chrome_version.as_deref(), Some("140.0.1.1"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"browser": {"headless": false}}"#).unwrap();
        assert!(!config.browser.headless);
        assert!(config.browser.incognito);
        assert_eq!(config.agent.max_tokens, 8192);
    }
}
