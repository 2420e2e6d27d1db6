use serde::{Deserialize, Serialize};
use ts_rs::TS;
use tokio::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;

use super::error::{AppError, AppResult};

/// Overrides `api.rates_url` when set.
pub const RATES_URL_ENV: &str = "CONVERTER_RATES_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings/")]
#[serde(default)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub preferences: UserPreferences,
    pub mock_backend: MockBackendSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings/")]
#[serde(default)]
pub struct ApiSettings {
    /// Rate endpoint; the base currency code is appended as the last path segment.
    pub rates_url: String,
    pub base_currency: String,
    /// Base URL the login client posts to.
    pub auth_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings/")]
#[serde(default)]
pub struct UserPreferences {
    pub default_currency_from: String,
    pub default_currency_to: String,
    pub default_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings/")]
#[serde(default)]
pub struct MockBackendSettings {
    pub enabled: bool,
    #[ts(type = "number")]
    pub login_delay_ms: u64,
    pub username: String,
    pub password: String,
    pub full_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            preferences: UserPreferences::default(),
            mock_backend: MockBackendSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            rates_url: "https://open.er-api.com/v6/latest".to_string(),
            base_currency: "USD".to_string(),
            auth_url: "http://localhost:4200/api".to_string(),
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_currency_from: "USD".to_string(),
            default_currency_to: "EUR".to_string(),
            default_amount: Some(1.0),
        }
    }
}

impl Default for MockBackendSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            login_delay_ms: 1000,
            username: "user1".to_string(),
            password: "pass1".to_string(),
            full_name: "AlexMaster".to_string(),
        }
    }
}

impl AppSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "currency-converter")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    /// Load from the platform config directory, writing defaults on first run.
    pub async fn load() -> AppResult<Self> {
        let path = Self::get_settings_path()?;
        let mut settings = Self::load_from(&path).await?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path).await?;
            log::info!("[Settings] Wrote defaults to {}", path.display());
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await
            .map_err(|e| AppError::Config(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await
                .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize settings: {}", e)))?;

        fs::write(path, content).await
            .map_err(|e| AppError::Config(format!("Failed to write settings file: {}", e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(RATES_URL_ENV) {
            if !url.trim().is_empty() {
                log::info!("[Settings] Using rates URL from {}", RATES_URL_ENV);
                self.api.rates_url = url.trim().to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("currency-converter-settings-{}-{}", tag, std::process::id()));
        path.push("settings.json");
        path
    }

    #[tokio::test]
    async fn missing_file_writes_defaults() {
        let path = temp_settings_path("defaults");
        let _ = std::fs::remove_file(&path);

        let settings = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(path.exists());

        let reloaded = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(reloaded, settings);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let path = temp_settings_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "api": { "base_currency": "EUR" } }"#).unwrap();

        let settings = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(settings.api.base_currency, "EUR");
        assert_eq!(settings.api.rates_url, ApiSettings::default().rates_url);
        assert_eq!(settings.mock_backend.login_delay_ms, 1000);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn malformed_file_is_a_config_error() {
        let path = temp_settings_path("broken");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = AppSettings::load_from(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        let _ = std::fs::remove_file(&path);
    }
}
