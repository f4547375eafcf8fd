use crate::bindings::label_for;
use crate::block::{BlockColors, VisualBlock};
use crate::keyboard::KeyboardState;
use crate::note::NoteName;
use crate::render::LabelRasterizer;
use crate::settings::Palette;
use crate::types::*;
use log::debug;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("sample library has no natural notes to lay out")]
    EmptyLibrary,
}

/// Geometry and styling inputs for the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// White key slot width `W`.
    pub key_width: f32,
    /// White key height `H`. Black keys are two thirds of it.
    pub key_height: f32,
    pub flash_duration_ms: Millis,
    pub palette: Palette,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            key_width: KEY_WIDTH,
            key_height: KEY_HEIGHT,
            flash_duration_ms: FLASH_DURATION_MS,
            palette: Palette::default(),
        }
    }
}

/// Lay out one block per playable note name.
///
/// White keys take fixed slots left to right in pitch order (octave, then
/// letter). A sharp gets a black key only when its natural is present too:
/// shifted right by half a slot so it straddles the boundary with the next
/// white key, and two thirds as tall. The highest white key gets no black
/// key, so every block stays inside the board.
///
/// Names that are not note names are ignored.
pub fn layout_board<'a, I>(
    names: I,
    config: &LayoutConfig,
    font: &dyn LabelRasterizer,
) -> Result<KeyboardState, LayoutError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut naturals = Vec::new();
    let mut sharps = HashSet::new();
    for name in names {
        match NoteName::decode(name) {
            Ok(note) if note.sharp => {
                sharps.insert(note);
            }
            Ok(note) => naturals.push(note),
            Err(e) => debug!("Layout: skipping {:?} ({})", name, e),
        }
    }
    if naturals.is_empty() {
        return Err(LayoutError::EmptyLibrary);
    }
    naturals.sort();
    naturals.dedup();

    let w = config.key_width;
    let h = config.key_height;
    let palette = &config.palette;
    let white_colors = BlockColors {
        rest: palette.white_rest,
        accent: palette.accent,
    };
    let black_colors = BlockColors {
        rest: palette.black_rest,
        accent: palette.accent,
    };

    let mut whites = Vec::with_capacity(naturals.len());
    let mut blacks = Vec::new();
    let last = naturals.len() - 1;
    for (i, &note) in naturals.iter().enumerate() {
        let bounds = Rect::new(i as f32 * w, 0.0, w, h);
        whites.push(make_block(
            note,
            bounds,
            false,
            white_colors,
            palette.white_label,
            config,
            font,
        ));

        let Ok(sharp) = note.sharpen() else {
            continue;
        };
        if !sharps.remove(&sharp) {
            continue;
        }
        // Past the last white slot
        if i == last {
            debug!("Layout: no block for {} (no white key to its right)", sharp);
            continue;
        }
        let bounds = Rect::new(bounds.x + w / 2.0, 0.0, w, h * 2.0 / 3.0);
        blacks.push(make_block(
            sharp,
            bounds,
            true,
            black_colors,
            palette.black_label,
            config,
            font,
        ));
    }
    for orphan in &sharps {
        debug!("Layout: no block for {} (natural {} missing)", orphan, orphan.naturalize());
    }

    let width = naturals.len() as f32 * w;
    // Whites first so black keys paint over them.
    whites.extend(blacks);
    Ok(KeyboardState::from_blocks(whites, width, h))
}

fn make_block(
    note: NoteName,
    bounds: Rect,
    is_black: bool,
    colors: BlockColors,
    label_color: Color,
    config: &LayoutConfig,
    font: &dyn LabelRasterizer,
) -> VisualBlock {
    let key_label = label_for(note).map(String::from).unwrap_or_default();
    VisualBlock::new(
        note,
        bounds,
        is_black,
        font.rasterize(&note.encode(), label_color),
        font.rasterize(&key_label, label_color),
        colors,
        config.flash_duration_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MonoFont;

    fn board(names: &[&str]) -> Result<KeyboardState, LayoutError> {
        layout_board(names.iter().copied(), &LayoutConfig::default(), &MonoFont::new(25.0))
    }

    fn note(s: &str) -> NoteName {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_library_is_rejected() {
        assert_eq!(board(&[]).err(), Some(LayoutError::EmptyLibrary));
        // Sharps alone give no white keys to anchor on
        assert_eq!(board(&["C#2", "click"]).err(), Some(LayoutError::EmptyLibrary));
    }

    #[test]
    fn test_whites_sorted_by_octave_then_letter() {
        let kb = board(&["C3", "B2", "A2", "G2", "D3", "C2"]).unwrap();
        let xs: Vec<(String, f32)> = ["C2", "G2", "A2", "B2", "C3", "D3"]
            .iter()
            .map(|s| (s.to_string(), kb.block(&note(s)).unwrap().bounds.x))
            .collect();
        for (i, (name, x)) in xs.iter().enumerate() {
            assert_eq!(*x, i as f32 * KEY_WIDTH, "{name} in slot {i}");
        }
    }

    #[test]
    fn test_lower_octave_strictly_left() {
        let kb = board(&["B2", "C3"]).unwrap();
        let b2 = kb.block(&note("B2")).unwrap().bounds;
        let c3 = kb.block(&note("C3")).unwrap().bounds;
        assert!(b2.x < c3.x);
        assert!(b2.right() <= c3.x);
    }

    #[test]
    fn test_black_key_centered_on_natural_right_edge() {
        let kb = board(&["C2", "C#2", "D2", "D#2", "E2", "F2", "F#2"]).unwrap();
        for (nat, sharp) in [("C2", "C#2"), ("D2", "D#2"), ("F2", "F#2")] {
            let white = kb.block(&note(nat)).unwrap();
            let black = kb.block(&note(sharp)).unwrap();
            assert!(black.is_black);
            assert!(!white.is_black);
            assert_eq!(black.bounds.center_x(), white.bounds.right());
            assert_eq!(black.bounds.y, 0.0);
            assert_eq!(black.bounds.w, KEY_WIDTH);
            assert_eq!(black.bounds.h, KEY_HEIGHT * 2.0 / 3.0);
        }
    }

    #[test]
    fn test_sharp_without_natural_gets_no_block() {
        let kb = board(&["C2", "D#2"]).unwrap();
        assert!(kb.block(&note("D#2")).is_none());
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn test_board_size_counts_naturals_only() {
        let kb = board(&["C2", "C#2", "D2", "E2", "README"]).unwrap();
        assert_eq!(kb.board_size(), (3.0 * KEY_WIDTH, KEY_HEIGHT));
        assert_eq!(kb.len(), 4);
    }

    #[test]
    fn test_no_black_key_past_last_white() {
        let kb = board(&["B6", "C7", "C#7", "A#6", "A6"]).unwrap();
        assert!(kb.block(&note("C#7")).is_none());
        assert!(kb.block(&note("A#6")).is_some());
        let (width, _) = kb.board_size();
        for b in kb.blocks() {
            assert!(b.bounds.right() <= width, "{} ends at {}", b.note, b.bounds.right());
        }
    }

    #[test]
    fn test_blacks_drawn_after_whites() {
        let kb = board(&["C#2", "C2", "D2"]).unwrap();
        let order: Vec<String> = kb.blocks().iter().map(|b| b.note.encode()).collect();
        assert_eq!(order, ["C2", "D2", "C#2"]);
    }

    #[test]
    fn test_labels_cached_on_blocks() {
        let kb = board(&["C2", "C#2", "B1"]).unwrap();
        let c2 = kb.block(&note("C2")).unwrap();
        assert_eq!(c2.name_glyph().text, "C2");
        assert_eq!(c2.key_glyph().text, "1");
        assert_eq!(c2.key_glyph().color, WHITE_KEY_LABEL);
        let cs2 = kb.block(&note("C#2")).unwrap();
        assert_eq!(cs2.key_glyph().text, "!");
        assert_eq!(cs2.key_glyph().color, BLACK_KEY_LABEL);
        // Outside the bound range: no key label
        assert!(kb.block(&note("B1")).unwrap().key_glyph().is_empty());
    }
}
