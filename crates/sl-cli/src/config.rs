//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sl_core::LayoutConfig;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Treatment timeline drawing settings.
    #[serde(default)]
    pub timeline: TimelineConfig,
}

/// Drawing settings for `sl timeline`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Default drawing width.
    pub width: f64,
    /// Space added below the deepest band.
    pub frame_margin: f64,
    pub base_band: f64,
    pub band_step: f64,
    pub collision_threshold: f64,
    pub open_end_offset: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        let layout = LayoutConfig::default();
        Self {
            width: 800.0,
            frame_margin: 40.0,
            base_band: layout.base_band,
            band_step: layout.band_step,
            collision_threshold: layout.collision_threshold,
            open_end_offset: layout.open_end_offset,
        }
    }
}

impl TimelineConfig {
    /// Band assignment settings.
    pub const fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            base_band: self.base_band,
            band_step: self.band_step,
            collision_threshold: self.collision_threshold,
            open_end_offset: self.open_end_offset,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("timeline", &self.timeline)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("sl.db"),
            timeline: TimelineConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SL_*, nested keys split on "__")
        figment = figment.merge(Env::prefixed("SL_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for sl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sl"))
}

/// Returns the platform-specific data directory for sl.
///
/// On Linux: `~/.local/share/sl`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("sl"))
}
