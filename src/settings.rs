//! Settings file: board geometry, flash timing and palette.
//!
//! Every field is optional in the JSON; missing ones take the built-in
//! defaults. Command-line flags are applied on top in `main`.

use crate::layout::LayoutConfig;
use crate::types::*;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub white_rest: Color,
    pub black_rest: Color,
    pub accent: Color,
    pub white_label: Color,
    pub black_label: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: BACKGROUND,
            white_rest: WHITE_KEY_REST,
            black_rest: BLACK_KEY_REST,
            accent: FLASH_ACCENT,
            white_label: WHITE_KEY_LABEL,
            black_label: BLACK_KEY_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub key_width: f32,
    pub key_height: f32,
    pub flash_ms: Millis,
    pub frame_rate_hz: u32,
    pub font_size: f32,
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_width: KEY_WIDTH,
            key_height: KEY_HEIGHT,
            flash_ms: FLASH_DURATION_MS,
            frame_rate_hz: FRAME_RATE_HZ,
            font_size: LABEL_FONT_SIZE,
            palette: Palette::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Load from a JSON file, falling back to defaults if the file is absent
    /// or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::read(path) {
            Ok(s) => {
                info!("Loaded settings from {:?}", path);
                s
            }
            Err(e) => {
                warn!("Failed to load settings {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            key_width: self.key_width,
            key_height: self.key_height,
            flash_duration_ms: self.flash_ms,
            palette: self.palette,
        }
    }

    /// Frame interval in milliseconds, at least 1.
    pub fn frame_interval_ms(&self) -> Millis {
        (1000 / self.frame_rate_hz.max(1) as Millis).max(1)
    }
}
