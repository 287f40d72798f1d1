//! Configuration for the desktop pet.
//!
//! Holds the persisted placement (position and scale) alongside the
//! tunables of the activity core. Missing fields fall back to defaults, so
//! a file written by an older version still loads.

use crate::collector::CollectorConfig;
use crate::core::activity_log::DEFAULT_RETENTION_MINUTES;
use crate::core::animation::CycleRanges;
use crate::core::classifier::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Scale change applied per scroll notch.
pub const SCALE_STEP: f64 = 0.1;

/// Longest accepted activity retention, one day.
pub const MAX_RETENTION_MINUTES: f64 = 24.0 * 60.0;

/// Main configuration for the pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window position, top-left corner
    pub x: i32,
    pub y: i32,

    /// Sprite scale factor
    pub scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,

    /// Period of the animation timer
    #[serde(with = "duration_millis")]
    pub tick_interval: Duration,

    /// How long activity events are retained
    pub retention_minutes: f64,

    pub classifier: ClassifierConfig,
    pub cycles: CycleRanges,
    pub sources: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            scale: 2.0,
            min_scale: 0.5,
            max_scale: 5.0,
            tick_interval: Duration::from_millis(100),
            retention_minutes: DEFAULT_RETENTION_MINUTES,
            classifier: ClassifierConfig::default(),
            cycles: CycleRanges::default(),
            sources: SourceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.sanitize();
        Ok(config)
    }

    /// Load from `path`, treating an unreadable or invalid file as absent.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring saved config: {e}");
            Self::default()
        })
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("TamagotchiPet")
            .join("config.json")
    }

    /// Bring loaded values back into range.
    pub fn sanitize(&mut self) {
        if self.x < 0 || self.y < 0 {
            self.x = 0;
            self.y = 0;
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            let defaults = Self::default();
            self.min_scale = defaults.min_scale;
            self.max_scale = defaults.max_scale;
        }
        self.scale = self.clamp_scale(self.scale);
        if self.tick_interval.is_zero() {
            self.tick_interval = Self::default().tick_interval;
        }
        if !(self.retention_minutes > 0.0 && self.retention_minutes <= MAX_RETENTION_MINUTES) {
            tracing::warn!(
                retention_minutes = self.retention_minutes,
                "retention out of range, using default"
            );
            self.retention_minutes = DEFAULT_RETENTION_MINUTES;
        }
    }

    /// Clamp a scale factor into `[min_scale, max_scale]`.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return Self::default().scale.clamp(self.min_scale, self.max_scale);
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// Apply a scroll gesture: positive delta grows, negative shrinks.
    ///
    /// Returns `true` if the scale changed and should be persisted.
    pub fn adjust_scale(&mut self, delta: i32) -> bool {
        if delta == 0 {
            return false;
        }
        let step = if delta > 0 { SCALE_STEP } else { -SCALE_STEP };
        let scale = self.clamp_scale(self.scale + step);
        if (scale - self.scale).abs() < f64::EPSILON {
            return false;
        }
        self.scale = scale;
        true
    }

    /// Record the window position after a drag.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x.max(0);
        self.y = y.max(0);
    }
}

/// Configuration for which input sources to capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub keyboard: bool,
    pub mouse: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
        }
    }
}

impl SourceConfig {
    /// Parse a `--sources` list such as `"keyboard, MOUSE"`.
    ///
    /// Names are trimmed and case-insensitive. `key` is accepted for the
    /// keyboard, `all` enables both, and unknown names are skipped with a
    /// warning.
    pub fn from_csv(list: &str) -> Self {
        let mut sources = Self {
            keyboard: false,
            mouse: false,
        };
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "keyboard" | "key" => sources.keyboard = true,
                "mouse" => sources.mouse = true,
                "all" => sources = Self::default(),
                _ => tracing::warn!(source = name, "ignoring unknown input source"),
            }
        }
        sources
    }

    /// Whether at least one producer would run.
    pub fn any_enabled(&self) -> bool {
        self.keyboard || self.mouse
    }
}

impl From<&SourceConfig> for CollectorConfig {
    fn from(sources: &SourceConfig) -> Self {
        Self {
            capture_keyboard: sources.keyboard,
            capture_mouse: sources.mouse,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
