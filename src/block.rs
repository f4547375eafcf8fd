use crate::note::NoteName;
use crate::render::{Glyph, Renderer};
use crate::types::*;

/// Flash state of one key block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashState {
    Resting,
    /// Fading back to rest; fully faded at `expiry`.
    Flashing { expiry: Millis },
}

/// Colors a block moves between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockColors {
    pub rest: Color,
    pub accent: Color,
}

/// Per-key render state: geometry, cached labels and the flash timer.
#[derive(Debug, Clone)]
pub struct VisualBlock {
    pub note: NoteName,
    pub bounds: Rect,
    pub is_black: bool,
    name_glyph: Glyph,
    key_glyph: Glyph,
    colors: BlockColors,
    flash: FlashState,
    flash_duration_ms: Millis,
}

impl VisualBlock {
    pub fn new(
        note: NoteName,
        bounds: Rect,
        is_black: bool,
        name_glyph: Glyph,
        key_glyph: Glyph,
        colors: BlockColors,
        flash_duration_ms: Millis,
    ) -> Self {
        Self {
            note,
            bounds,
            is_black,
            name_glyph,
            key_glyph,
            colors,
            flash: FlashState::Resting,
            flash_duration_ms: flash_duration_ms.max(1),
        }
    }

    pub fn flash_state(&self) -> FlashState {
        self.flash
    }

    pub fn is_flashing(&self) -> bool {
        matches!(self.flash, FlashState::Flashing { .. })
    }

    pub fn name_glyph(&self) -> &Glyph {
        &self.name_glyph
    }

    pub fn key_glyph(&self) -> &Glyph {
        &self.key_glyph
    }

    /// Fade length after a trigger, at least 1 ms.
    pub fn flash_duration_ms(&self) -> Millis {
        self.flash_duration_ms
    }

    /// Start a full-strength flash at `now` that fades out over this
    /// block's flash duration.
    pub fn flash_from(&mut self, now: Millis) {
        self.activate_flash(now + self.flash_duration_ms);
    }

    /// Start (or restart) the flash. The latest expiry always wins.
    pub fn activate_flash(&mut self, expiry: Millis) {
        self.flash = FlashState::Flashing { expiry };
    }

    /// Return to rest once the clock has reached the expiry.
    pub fn update(&mut self, now: Millis) {
        if let FlashState::Flashing { expiry } = self.flash {
            if now >= expiry {
                self.flash = FlashState::Resting;
            }
        }
    }

    /// Remaining flash strength in 0.0–1.0: 1.0 right after a trigger,
    /// falling linearly to 0.0 at expiry.
    pub fn flash_fraction(&self, now: Millis) -> f32 {
        match self.flash {
            FlashState::Resting => 0.0,
            FlashState::Flashing { expiry } => {
                let remaining = expiry.saturating_sub(now) as f32;
                (remaining / self.flash_duration_ms as f32).clamp(0.0, 1.0)
            }
        }
    }

    /// Fill color at `now`. Not cached: a pure function of the clock.
    pub fn color_at(&self, now: Millis) -> Color {
        match self.flash {
            FlashState::Resting => self.colors.rest,
            FlashState::Flashing { .. } => self
                .colors
                .rest
                .lerp(self.colors.accent, self.flash_fraction(now)),
        }
    }

    /// Fill the key, then the note name 20px above the bottom edge and the
    /// key character 40px above the name.
    pub fn draw(&self, renderer: &mut dyn Renderer, now: Millis) {
        renderer.draw_rect(self.bounds, self.color_at(now));

        let cx = self.bounds.center_x();
        let name_bottom = self.bounds.bottom() - 20.0;
        let name = &self.name_glyph;
        renderer.blit_glyph(name, cx - name.width / 2.0, name_bottom - name.height);

        let key_bottom = name_bottom - 40.0;
        let key = &self.key_glyph;
        renderer.blit_glyph(key, cx - key.width / 2.0, key_bottom - key.height);
    }
}
