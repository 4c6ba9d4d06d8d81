pub mod session;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reimbursement::pagination::DEFAULT_PAGE_SIZE;

const APP_DIR: &str = "reimburse";

/// Optional `#RRGGBB` overrides for the default palette
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Base URL of the reimbursement API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Initial page size (snapped to the selector options)
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,

    /// Where exports land; defaults to the user's download directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,

    /// Desktop notification after an export
    #[serde(default)]
    pub notifications: bool,

    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_items_per_page() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            items_per_page: default_items_per_page(),
            export_dir: None,
            notifications: false,
            theme: ThemeConfig::default(),
        }
    }
}

/// `<base>/reimburse`, created if missing
pub(crate) fn app_dir(base: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    let dir = base
        .ok_or_else(|| anyhow::anyhow!("Could not find {} directory", what))?
        .join(APP_DIR);

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("Could not create {} directory: {}", what, e);
    }

    Ok(dir)
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        Ok(app_dir(dirs::config_dir(), "config")?.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Ok(Self::load_from(&path)),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    /// Load from `path`; unreadable or invalid files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            return AppConfig::default();
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        config
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Configured export directory, else downloads, else the working directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            api_base_url: "https://api.example.com".to_string(),
            request_timeout_secs: 30,
            items_per_page: 10,
            export_dir: Some(PathBuf::from("/tmp/exports")),
            notifications: true,
            theme: ThemeConfig {
                accent: Some("#2980b9".to_string()),
                ..Default::default()
            },
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("notifications = true\n").unwrap();

        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.items_per_page, 6);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert!(config.notifications);
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_load_from_missing_writes_default() {
        let dir = std::env::temp_dir().join(format!("reimburse-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let config = AppConfig::load_from(&path);
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        std::fs::write(&path, "items_per_page = [").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_explicit_export_dir_wins() {
        let config = AppConfig {
            export_dir: Some(PathBuf::from("/srv/out")),
            ..Default::default()
        };
        assert_eq!(config.export_dir(), PathBuf::from("/srv/out"));
    }
}
