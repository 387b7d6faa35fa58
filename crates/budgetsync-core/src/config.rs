//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL and the last used email address.
//!
//! Configuration is stored at `~/.config/budgetsync/config.json`. The
//! `BUDGETSYNC_API_URL` and `BUDGETSYNC_EMAIL` environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "budgetsync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

pub const ENV_API_URL: &str = "BUDGETSYNC_API_URL";
pub const ENV_EMAIL: &str = "BUDGETSYNC_EMAIL";
pub const ENV_PASSWORD: &str = "BUDGETSYNC_PASSWORD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default location of the config file.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root of the local cache. Each user gets a subdirectory below it.
    pub fn cache_root() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend URL: environment, then config file, then the default.
    pub fn api_base_url(&self) -> String {
        Self::resolve(std::env::var(ENV_API_URL).ok(), self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Email to prefill at login.
    pub fn default_email(&self) -> Option<String> {
        Self::resolve(std::env::var(ENV_EMAIL).ok(), self.last_email.clone())
    }

    /// Password from the environment, for scripted use.
    pub fn env_password() -> Option<String> {
        std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty())
    }

    fn resolve(env: Option<String>, file: Option<String>) -> Option<String> {
        env.into_iter()
            .chain(file)
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.json")).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/config.json");
        let config = Config {
            api_base_url: Some("https://budget.example.com".to_string()),
            last_email: Some("ana@example.com".to_string()),
            remember_me: true,
        };
        config.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path).expect("load"), config);
    }

    #[test]
    fn test_resolve_prefers_env_then_file() {
        assert_eq!(
            Config::resolve(Some("env".into()), Some("file".into())),
            Some("env".to_string())
        );
        assert_eq!(Config::resolve(Some("  ".into()), Some("file".into())), Some("file".to_string()));
        assert_eq!(Config::resolve(None, None), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"last_email":"a@b.co"}"#).expect("write");
        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.last_email.as_deref(), Some("a@b.co"));
        assert!(!config.remember_me);
    }
}
