//! Drawing port. The board only ever asks for filled rectangles and
//! pre-rendered label glyphs; rasterization belongs to the host.

use crate::types::{Color, Rect};
use serde::{Deserialize, Serialize};

/// A label rendered once at layout time and blitted every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub text: String,
    pub color: Color,
    pub size: f32,
    pub width: f32,
    pub height: f32,
}

impl Glyph {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Turns label text into glyphs. Implemented by whatever owns the font.
pub trait LabelRasterizer {
    fn rasterize(&self, text: &str, color: Color) -> Glyph;
}

/// Fixed-advance font metrics: every character is `size / 2` wide.
#[derive(Debug, Clone, Copy)]
pub struct MonoFont {
    pub size: f32,
}

impl MonoFont {
    pub fn new(size: f32) -> Self {
        Self { size }
    }
}

impl LabelRasterizer for MonoFont {
    fn rasterize(&self, text: &str, color: Color) -> Glyph {
        let advance = self.size / 2.0;
        Glyph {
            text: text.to_string(),
            color,
            size: self.size,
            width: advance * text.chars().count() as f32,
            height: if text.is_empty() { 0.0 } else { self.size },
        }
    }
}

pub trait Renderer {
    /// Start a frame by clearing to `background`.
    fn begin_frame(&mut self, background: Color);
    fn draw_rect(&mut self, bounds: Rect, color: Color);
    /// `x`/`y` are the glyph's top-left corner.
    fn blit_glyph(&mut self, glyph: &Glyph, x: f32, y: f32);
    fn end_frame(&mut self);
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    Rect {
        bounds: Rect,
        color: Color,
    },
    Text {
        text: String,
        color: Color,
        size: f32,
        x: f32,
        y: f32,
    },
}

/// Records the last frame as a list of commands. Used by the webview host,
/// which replays them on a canvas, and by tests.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    current: Vec<DrawCommand>,
    last: Vec<DrawCommand>,
    frames: u64,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the most recently finished frame.
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Fill color of the first rectangle drawn exactly at `bounds`.
    pub fn color_at(&self, bounds: Rect) -> Option<Color> {
        self.last.iter().find_map(|cmd| match cmd {
            DrawCommand::Rect { bounds: b, color } if *b == bounds => Some(*color),
            _ => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.last)
    }
}

impl Renderer for FrameRecorder {
    fn begin_frame(&mut self, background: Color) {
        self.current.clear();
        self.current.push(DrawCommand::Clear { color: background });
    }

    fn draw_rect(&mut self, bounds: Rect, color: Color) {
        self.current.push(DrawCommand::Rect { bounds, color });
    }

    fn blit_glyph(&mut self, glyph: &Glyph, x: f32, y: f32) {
        if glyph.is_empty() {
            return;
        }
        self.current.push(DrawCommand::Text {
            text: glyph.text.clone(),
            color: glyph.color,
            size: glyph.size,
            x,
            y,
        });
    }

    fn end_frame(&mut self) {
        std::mem::swap(&mut self.current, &mut self.last);
        self.current.clear();
        self.frames += 1;
    }
}
