//! Configuration and color scheme management for reborn.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.reborn/config.toml`
//! - Built-in color schemes (light, dark)
//! - Per-tag colour overrides
//!
//! # Configuration File
//!
//! ```toml
//! # Color scheme: light, dark
//! color_scheme = "light"
//!
//! [ui]
//! title = "Reborn in a New World"
//! scrollback_lines = 5000
//! show_status_bar = true
//!
//! [tags]
//! bold_yellow = "#C5A100"
//!
//! [log]
//! level = "debug"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::ansi::StyleTag;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid colour {0:?}, expected #RRGGBB")]
    InvalidColor(String),
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Color scheme name
    pub color_scheme: String,
    pub ui: UiConfig,
    /// Tag colour overrides
    pub tags: TagColors,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_scheme: "light".to_string(),
            ui: UiConfig::default(),
            tags: TagColors::default(),
            log: LogConfig::default(),
        }
    }
}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    /// Lines kept in the transcript before the oldest are dropped
    pub scrollback_lines: usize,
    pub show_status_bar: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Reborn in a New World".to_string(),
            scrollback_lines: 5000,
            show_status_bar: true,
        }
    }
}

/// Optional `#RRGGBB` overrides for the four style tags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagColors {
    pub bold_yellow: Option<String>,
    pub bold_cyan: Option<String>,
    pub bold_red: Option<String>,
    pub bold_magenta: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        app_dir().map(|dir| dir.join("config.toml"))
    }

    /// Resolve the color scheme, applying tag overrides
    pub fn color_scheme(&self) -> ColorScheme {
        let mut scheme = ColorScheme::by_name(&self.color_scheme);
        let overrides = [
            (StyleTag::BoldYellow, &self.tags.bold_yellow),
            (StyleTag::BoldCyan, &self.tags.bold_cyan),
            (StyleTag::BoldRed, &self.tags.bold_red),
            (StyleTag::BoldMagenta, &self.tags.bold_magenta),
        ];
        for (tag, value) in overrides {
            let Some(hex) = value else { continue };
            match Color::from_hex(hex) {
                Ok(color) => scheme.set_tag_color(tag, color),
                Err(e) => warn!("Tag {}: {}", tag.name(), e),
            }
        }
        scheme
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Color scheme definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: String,

    // Transcript
    pub text_bg: Color,
    pub text_fg: Color,

    // Style tags
    pub bold_yellow: Color,
    pub bold_cyan: Color,
    pub bold_red: Color,
    pub bold_magenta: Color,

    // Input row
    pub input_bg: Color,
    pub input_fg: Color,
    pub button_bg: Color,
    pub button_fg: Color,
    pub button_disabled_fg: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::light()
    }
}

impl ColorScheme {
    /// White background, like a plain text window
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            text_bg: Color::new(255, 255, 255),
            text_fg: Color::new(0, 0, 0),
            bold_yellow: Color::new(0xC5, 0xA1, 0x00),
            bold_cyan: Color::new(0x00, 0x8B, 0x8B),
            bold_red: Color::new(0xB0, 0x00, 0x20),
            bold_magenta: Color::new(0x8E, 0x24, 0xAA),
            input_bg: Color::new(240, 240, 240),
            input_fg: Color::new(0, 0, 0),
            button_bg: Color::new(210, 210, 210),
            button_fg: Color::new(0, 0, 0),
            button_disabled_fg: Color::new(150, 150, 150),
            status_bar_bg: Color::new(60, 60, 180),
            status_bar_fg: Color::new(255, 255, 255),
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            text_bg: Color::new(30, 30, 30),
            text_fg: Color::new(220, 220, 220),
            bold_yellow: Color::new(250, 210, 60),
            bold_cyan: Color::new(80, 220, 220),
            bold_red: Color::new(255, 90, 100),
            bold_magenta: Color::new(210, 130, 240),
            input_bg: Color::new(50, 50, 50),
            input_fg: Color::new(230, 230, 230),
            button_bg: Color::new(70, 70, 70),
            button_fg: Color::new(240, 240, 240),
            button_disabled_fg: Color::new(120, 120, 120),
            status_bar_bg: Color::new(0, 100, 0),
            status_bar_fg: Color::new(255, 255, 255),
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["light", "dark"]
    }

    /// Foreground for a style tag
    pub fn tag_color(&self, tag: StyleTag) -> Color {
        match tag {
            StyleTag::None => self.text_fg,
            StyleTag::BoldYellow => self.bold_yellow,
            StyleTag::BoldCyan => self.bold_cyan,
            StyleTag::BoldRed => self.bold_red,
            StyleTag::BoldMagenta => self.bold_magenta,
        }
    }

    fn set_tag_color(&mut self, tag: StyleTag, color: Color) {
        match tag {
            StyleTag::None => self.text_fg = color,
            StyleTag::BoldYellow => self.bold_yellow = color,
            StyleTag::BoldCyan => self.bold_cyan = color,
            StyleTag::BoldRed => self.bold_red = color,
            StyleTag::BoldMagenta => self.bold_magenta = color,
        }
    }
}

/// `~/.reborn`, created on first use
pub fn app_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".reborn");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
