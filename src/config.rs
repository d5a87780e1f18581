use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{Facing, ResolutionHint, DEFAULT_JPEG_QUALITY};
use crate::error::ConfigError;

/// Environment variable that overrides the stored API token
pub const TOKEN_ENV_VAR: &str = "LESION_CAPTURE_TOKEN";

const APP_DIR_NAME: &str = "LesionCapture";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the analysis API
    pub api_base_url: String,

    /// Bearer token for the API (overridden by `LESION_CAPTURE_TOKEN`)
    pub auth_token: Option<String>,

    /// Camera used when the user does not pick one
    pub preferred_facing: Facing,

    /// Preferred camera resolution
    pub resolution_hint: ResolutionHint,

    /// JPEG quality for captured frames (1-100)
    pub jpeg_quality: u8,

    /// HTTP timeout for a submission
    pub request_timeout_secs: u64,

    /// Wait before submission starts, cancellable by the user (0 = none)
    pub processing_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            preferred_facing: Facing::Environment,
            resolution_hint: ResolutionHint::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            request_timeout_secs: 30,
            processing_delay_ms: 0,
        }
    }
}

impl Config {
    /// Load configuration from the platform-specific config directory.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    /// `LESION_CAPTURE_TOKEN` wins over the stored token either way.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_or_create(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| save_failed(Box::new(e)))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Directory for log files (falls back to ./logs)
    pub fn log_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if self.resolution_hint.width == 0 || self.resolution_hint.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution_hint must be non-zero, got {}x{}",
                self.resolution_hint.width, self.resolution_hint.height
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_token_override(env::var(TOKEN_ENV_VAR).ok());
    }

    fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token {
            if !token.trim().is_empty() {
                self.auth_token = Some(token.trim().to_string());
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}
