use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
/// Persisted application settings for Lightbox.
pub struct AppConfig {
    pub cloud_name: Option<String>,
    pub library_tag: Option<String>,
    pub api_base_url: Option<String>,
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lightbox").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_default()
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }
}

/// Connection settings after applying environment overrides to the config
/// file values. The cloud name is mandatory; everything else has defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cloud_name: String,
    pub library_tag: Option<String>,
    pub api_base_url: String,
}

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api";

impl Settings {
    /// Resolve settings from the environment and the config file. Returns
    /// `None` when no cloud name is configured anywhere.
    pub fn resolve(config: &AppConfig) -> Option<Self> {
        Self::from_parts(
            non_empty(std::env::var("LIGHTBOX_CLOUD_NAME").ok()),
            non_empty(std::env::var("LIGHTBOX_LIBRARY_TAG").ok()),
            non_empty(std::env::var("LIGHTBOX_API_BASE").ok()),
            config,
        )
    }

    fn from_parts(
        env_cloud: Option<String>,
        env_tag: Option<String>,
        env_base: Option<String>,
        config: &AppConfig,
    ) -> Option<Self> {
        let cloud_name = env_cloud.or_else(|| non_empty(config.cloud_name.clone()))?;
        Some(Self {
            cloud_name,
            library_tag: env_tag.or_else(|| non_empty(config.library_tag.clone())),
            api_base_url: env_base
                .or_else(|| non_empty(config.api_base_url.clone()))
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_API_BASE, Settings};

    fn config(cloud: Option<&str>, tag: Option<&str>, base: Option<&str>) -> AppConfig {
        AppConfig {
            cloud_name: cloud.map(str::to_string),
            library_tag: tag.map(str::to_string),
            api_base_url: base.map(str::to_string),
            ..AppConfig::default()
        }
    }

    #[test]
    fn missing_cloud_name_yields_no_settings() {
        assert!(Settings::from_parts(None, None, None, &config(None, None, None)).is_none());
    }

    #[test]
    fn config_values_apply_when_env_is_absent() {
        let settings = Settings::from_parts(
            None,
            None,
            None,
            &config(Some("demo"), Some("library"), Some("https://api.example")),
        )
        .expect("cloud name present");
        assert_eq!(settings.cloud_name, "demo");
        assert_eq!(settings.library_tag.as_deref(), Some("library"));
        assert_eq!(settings.api_base_url, "https://api.example");
    }

    #[test]
    fn env_overrides_beat_config_values() {
        let settings = Settings::from_parts(
            Some("env-cloud".to_string()),
            Some("env-tag".to_string()),
            None,
            &config(Some("demo"), Some("library"), None),
        )
        .expect("cloud name present");
        assert_eq!(settings.cloud_name, "env-cloud");
        assert_eq!(settings.library_tag.as_deref(), Some("env-tag"));
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn blank_values_are_treated_as_absent() {
        assert!(Settings::from_parts(None, None, None, &config(Some("  "), None, None)).is_none());
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        if let Some(path) = AppConfig::config_path() {
            assert!(path.ends_with("lightbox/config.toml"));
        }
    }
}
