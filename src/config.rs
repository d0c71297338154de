//! deploy-view Configuration Module
//!
//! Config is stored in `~/.config/deploy-view/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (`DEPLOY_VIEW_LOG`, `NO_COLOR`, `DEPLOY_VIEW_HEADLESS`)
//! 3. Config file
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DeployViewError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeployViewConfig {
    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub headless: HeadlessConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Interactive view settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Redraw interval for the elapsed clock and spinners
    pub tick_rate_ms: u64,

    /// Share of the body width given to the item list
    pub list_width_pct: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 250,
            list_width_pct: 40,
        }
    }
}

/// Headless log settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Always use headless mode, even on a terminal
    pub always: bool,
    pub color: bool,
    /// Prefix lines with `[HH:MM:SS]`
    pub timestamps: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            always: false,
            color: true,
            timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (e.g. `info`, `deploy_view=debug`)
    pub level: String,

    /// Log file for the interactive view (defaults next to the config file)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl DeployViewConfig {
    /// Returns `~/.config/deploy-view/` on Unix, `%APPDATA%/deploy-view/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deploy-view")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error if the file exists but is malformed or out of range.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| DeployViewError::Config {
            reason: format!("Failed to read config file: {}", e),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| DeployViewError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| DeployViewError::Config {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| DeployViewError::Config {
            reason: format!("Failed to write config file: {}", e),
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DeployViewError::Config {
            reason: format!("Failed to serialize config: {}", e),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.ui.tick_rate_ms < 10 {
            return Err(DeployViewError::Config {
                reason: format!(
                    "ui.tick_rate_ms must be at least 10 (got {})",
                    self.ui.tick_rate_ms
                ),
            });
        }
        if !(20..=80).contains(&self.ui.list_width_pct) {
            return Err(DeployViewError::Config {
                reason: format!(
                    "ui.list_width_pct must be between 20 and 80 (got {})",
                    self.ui.list_width_pct
                ),
            });
        }
        Ok(())
    }

    /// Merge with environment variables
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Merge with variables from `lookup` (environment values win over the file)
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("DEPLOY_VIEW_LOG").filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }

        // https://no-color.org: any non-empty value disables colour
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.headless.color = false;
        }

        if let Some(value) = lookup("DEPLOY_VIEW_HEADLESS") {
            self.headless.always =
                matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        self
    }

    /// Log file used by the interactive view
    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("deploy-view.log"))
    }
}
