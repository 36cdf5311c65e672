//! Decoration configuration.
//!
//! Loaded from a TOML file under the platform config directory, with
//! every field defaulting so a partial (or absent) file is fine. The
//! addon re-reads nothing by itself; the host pushes a fresh config
//! through `apply_config`, and [`DecorationConfig::diff`] scopes the
//! resulting refresh work to the keys that actually changed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::style::Icons;
use crate::visibility::VisibilityPolicy;

/// Errors from loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Where decorations appear: gutter, overview ruler, both, never.
    pub visibility: VisibilityPolicy,
    /// Icon for running commands and commands without an exit code.
    pub default_icon: String,
    pub success_icon: String,
    pub error_icon: String,
    /// Current terminal font size, in pixels.
    pub font_size: f64,
    /// Font size the decoration artwork was designed against.
    pub default_font_size: f64,
    pub line_height: f64,
    /// Debounce before a hover tooltip appears.
    pub hover_delay_ms: u64,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            visibility: VisibilityPolicy::Both,
            default_icon: "circle-outline".to_string(),
            success_icon: "primitive-dot".to_string(),
            error_icon: "error-small".to_string(),
            font_size: 14.0,
            default_font_size: 14.0,
            line_height: 1.0,
            hover_delay_ms: 500,
        }
    }
}

impl DecorationConfig {
    /// Load from the default path; an absent file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// `<config dir>/termdeco/config.toml`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("termdeco").join("config.toml"))
    }

    pub fn icons(&self) -> Icons<'_> {
        Icons {
            default_icon: &self.default_icon,
            success_icon: &self.success_icon,
            error_icon: &self.error_icon,
        }
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    /// Which groups of keys differ between `self` and `next`.
    pub fn diff(&self, next: &Self) -> ConfigDelta {
        ConfigDelta {
            visibility: self.visibility != next.visibility,
            icons: self.default_icon != next.default_icon
                || self.success_icon != next.success_icon
                || self.error_icon != next.error_icon,
            layout: self.font_size != next.font_size
                || self.default_font_size != next.default_font_size
                || self.line_height != next.line_height,
            hover: self.hover_delay_ms != next.hover_delay_ms,
        }
    }
}

/// Change-notification scope for a config update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDelta {
    pub visibility: bool,
    pub icons: bool,
    pub layout: bool,
    pub hover: bool,
}

impl ConfigDelta {
    pub fn any(&self) -> bool {
        self.visibility || self.icons || self.layout || self.hover
    }
}
