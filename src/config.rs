//! Configuration module
//!
//! Loaded from a TOML file; the backend coordinates can also come from
//! `SUPABASE_URL` / `SUPABASE_ANON_KEY`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::DEFAULT_PAGE_SIZE;

/// Env var holding an alternative config file path.
pub const CONFIG_PATH_ENV: &str = "ACADEMY_ADMIN_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Remote backend coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub page_size: u32,
    /// Public origin of the console; recovery links land on
    /// `<site_url>/reset-password`.
    pub site_url: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            site_url: "http://localhost:8080".to_string(),
        }
    }
}

impl UiConfig {
    pub fn reset_password_url(&self) -> String {
        format!("{}/reset-password", self.site_url.trim_end_matches('/'))
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Read the file at `path` and apply env overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Write the config, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("SUPABASE_URL").ok(),
            std::env::var("SUPABASE_ANON_KEY").ok(),
        );
    }

    fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|v| !v.is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = anon_key.filter(|v| !v.is_empty()) {
            self.backend.anon_key = key;
        }
    }

    /// Checks that the backend is reachable in principle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.is_empty() {
            return Err(ConfigError::Invalid("backend.url is not set".into()));
        }
        url::Url::parse(&self.backend.url)
            .map_err(|e| ConfigError::Invalid(format!("backend.url: {}", e)))?;
        if self.backend.anon_key.is_empty() {
            return Err(ConfigError::Invalid("backend.anon_key is not set".into()));
        }
        if self.ui.page_size == 0 {
            return Err(ConfigError::Invalid("ui.page_size must be positive".into()));
        }
        Ok(())
    }
}

/// `$ACADEMY_ADMIN_CONFIG`, else `<config dir>/tecmarsign-admin/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tecmarsign-admin")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.ui.page_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_backend_is_invalid() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("backend.url"));
    }

    #[test]
    fn overrides_replace_backend_coordinates() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("https://env.supabase.co".into()), Some(String::new()));
        assert_eq!(config.backend.url, "https://env.supabase.co");
        assert_eq!(config.backend.anon_key, "");
    }

    #[test]
    fn reset_url_strips_trailing_slash() {
        let ui = UiConfig {
            site_url: "https://admin.example.com/".into(),
            ..Default::default()
        };
        assert_eq!(ui.reset_password_url(), "https://admin.example.com/reset-password");
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("academy-admin-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let mut config = AppConfig::default();
        config.backend.url = "https://demo.supabase.co".into();
        config.backend.anon_key = "anon".into();
        config.save(&path).unwrap();

        let loaded = AppConfig::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_dir_all(dir);
    }
}
