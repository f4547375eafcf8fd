use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::bindings::KeyCode;

/// Milliseconds on the session's monotonic clock.
pub type Millis = u64;

// ─── Geometry ───────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in board pixels. Origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }
}

// ─── Color ──────────────────────────────────────────────────────────────────

/// 8-bit RGB color. Serializes as `"#RRGGBB"` so settings files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation toward `other`. `t` is clamped to 0.0–1.0.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("invalid color {0:?}: expected #RRGGBB")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// ─── Input messages ─────────────────────────────────────────────────────────

/// One discrete key-down. Key repeat is filtered out by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: KeyCode, shift: bool) -> Self {
        Self { key, shift }
    }
}

/// Messages from input sources (stdin, simulator, webview) to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Quit,
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the piano session.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

/// How long a flash takes to fade back to the resting color.
pub const FLASH_DURATION_MS: Millis = 5500;
/// White key slot size in board pixels.
pub const KEY_WIDTH: f32 = 38.0;
pub const KEY_HEIGHT: f32 = 300.0;
pub const FRAME_RATE_HZ: u32 = 60;
pub const LABEL_FONT_SIZE: f32 = 25.0;

pub const BACKGROUND: Color = Color::rgb(0x33, 0x33, 0x33);
pub const WHITE_KEY_REST: Color = Color::rgb(0xFF, 0xFF, 0xFF);
pub const BLACK_KEY_REST: Color = Color::rgb(0x00, 0x00, 0x00);
pub const FLASH_ACCENT: Color = Color::rgb(0x00, 0xA2, 0xE8);
pub const WHITE_KEY_LABEL: Color = Color::rgb(0x00, 0x00, 0x00);
pub const BLACK_KEY_LABEL: Color = Color::rgb(0xDD, 0xDD, 0xDD);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let c: Color = "#00A2E8".parse().unwrap();
        assert_eq!(c, FLASH_ACCENT);
        assert_eq!(c.to_string(), "#00A2E8");
    }

    #[test]
    fn test_color_rejects_bad_hex() {
        assert!("00A2E8".parse::<Color>().is_err());
        assert!("#00A2E".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_lerp_endpoints_and_clamp() {
        let a = BLACK_KEY_REST;
        let b = FLASH_ACCENT;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 2.0), b);
        assert_eq!(a.lerp(b, -1.0), a);
        assert_eq!(a.lerp(b, 0.5), Color::rgb(0, 0x51, 0x74));
    }

    #[test]
    fn test_color_serde_as_string() {
        let json = serde_json::to_string(&BACKGROUND).unwrap();
        assert_eq!(json, "\"#333333\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BACKGROUND);
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(38.0, 0.0, 38.0, 300.0);
        assert_eq!(r.right(), 76.0);
        assert_eq!(r.bottom(), 300.0);
        assert_eq!(r.center_x(), 57.0);
    }
}
