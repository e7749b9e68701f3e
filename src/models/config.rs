//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::LatLon;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Map viewpoint and camera tuning
    #[serde(default)]
    pub map: MapConfig,

    /// Toast timing
    #[serde(default)]
    pub notify: NotifyConfig,

    /// User-facing client settings
    #[serde(default)]
    pub settings: Settings,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Serialize the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::config(format!("api.base_url is not a URL: {e}")))?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if LatLon::new(self.map.default_center[0], self.map.default_center[1]).is_none() {
            return Err(AppError::validation(
                "map.default_center must be a valid [lat, lon]",
            ));
        }
        let zooms = [
            self.map.default_zoom,
            self.map.select_zoom,
            self.map.focus_zoom,
            self.map.spin_zoom,
            self.map.restore_zoom,
        ];
        if zooms.iter().any(|z| !z.is_finite() || *z < 0.0) {
            return Err(AppError::validation("map zoom levels must be >= 0"));
        }
        if self.notify.visit_toast_ms == 0 || self.notify.milestone_toast_ms == 0 {
            return Err(AppError::validation("notify toast durations must be > 0"));
        }
        Ok(())
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Map viewpoint and camera tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial `[lat, lon]` of the map surface
    #[serde(default = "defaults::default_center")]
    pub default_center: [f64; 2],

    #[serde(default = "defaults::default_zoom")]
    pub default_zoom: f64,

    /// Camera move on any selection change
    #[serde(default = "defaults::select_zoom")]
    pub select_zoom: f64,
    #[serde(default = "defaults::select_secs")]
    pub select_secs: f64,

    /// Camera move when a marker is activated
    #[serde(default = "defaults::focus_zoom")]
    pub focus_zoom: f64,
    #[serde(default = "defaults::focus_secs")]
    pub focus_secs: f64,

    /// Camera move after a spin
    #[serde(default = "defaults::spin_zoom")]
    pub spin_zoom: f64,
    #[serde(default = "defaults::spin_secs")]
    pub spin_secs: f64,

    /// Un-animated view set on the last visited place at load
    #[serde(default = "defaults::restore_zoom")]
    pub restore_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: defaults::default_center(),
            default_zoom: defaults::default_zoom(),
            select_zoom: defaults::select_zoom(),
            select_secs: defaults::select_secs(),
            focus_zoom: defaults::focus_zoom(),
            focus_secs: defaults::focus_secs(),
            spin_zoom: defaults::spin_zoom(),
            spin_secs: defaults::spin_secs(),
            restore_zoom: defaults::restore_zoom(),
        }
    }
}

/// Toast timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "defaults::visit_toast_ms")]
    pub visit_toast_ms: u64,

    #[serde(default = "defaults::milestone_toast_ms")]
    pub milestone_toast_ms: u64,
}

impl NotifyConfig {
    pub fn visit_toast(&self) -> Duration {
        Duration::from_millis(self.visit_toast_ms)
    }

    pub fn milestone_toast(&self) -> Duration {
        Duration::from_millis(self.milestone_toast_ms)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            visit_toast_ms: defaults::visit_toast_ms(),
            milestone_toast_ms: defaults::milestone_toast_ms(),
        }
    }
}

/// Client settings the explorer consumes but does not own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Audio cues on visits, milestones and page load
    #[serde(default = "defaults::sound_enabled")]
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: defaults::sound_enabled(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Api defaults
    pub fn base_url() -> String {
        "http://localhost:5000/api/".into()
    }
    pub fn user_agent() -> String {
        "explorer/0.1 (+https://github.com/zyscope)".into()
    }
    pub fn timeout() -> u64 {
        15
    }

    // Map defaults
    pub fn default_center() -> [f64; 2] {
        [20.0, 0.0]
    }
    pub fn default_zoom() -> f64 {
        2.2
    }
    pub fn select_zoom() -> f64 {
        4.5
    }
    pub fn select_secs() -> f64 {
        0.6
    }
    pub fn focus_zoom() -> f64 {
        5.0
    }
    pub fn focus_secs() -> f64 {
        0.7
    }
    pub fn spin_zoom() -> f64 {
        5.0
    }
    pub fn spin_secs() -> f64 {
        1.1
    }
    pub fn restore_zoom() -> f64 {
        4.5
    }

    // Notify defaults
    pub fn visit_toast_ms() -> u64 {
        1800
    }
    pub fn milestone_toast_ms() -> u64 {
        2500
    }

    pub fn sound_enabled() -> bool {
        true
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.api.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_center() {
        let mut config = Config::default();
        config.map.default_center = [120.0, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://example.com/v1/\"\n\n[settings]\nsound_enabled = false"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://example.com/v1/");
        assert_eq!(config.api.timeout_secs, 15);
        assert!(!config.settings.sound_enabled);
        assert_eq!(config.map.select_zoom, 4.5);
        assert_eq!(config.notify.visit_toast(), Duration::from_millis(1800));
    }

    #[test]
    fn load_or_default_survives_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config.notify.milestone_toast_ms, 2500);
    }

    #[test]
    fn toml_round_trip_keeps_values() {
        let mut config = Config::default();
        config.map.spin_secs = 2.0;
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.map.spin_secs, 2.0);
    }
}
