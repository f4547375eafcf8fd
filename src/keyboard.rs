use crate::block::VisualBlock;
use crate::note::NoteName;
use crate::render::Renderer;
use crate::types::*;
use std::collections::HashMap;

/// Every key block on the board, in draw order, plus a by-note index.
/// Built once by [`crate::layout::layout_board`]; owned by the session.
#[derive(Debug, Clone)]
pub struct KeyboardState {
    blocks: Vec<VisualBlock>,
    index: HashMap<NoteName, usize>,
    width: f32,
    height: f32,
}

impl KeyboardState {
    pub fn from_blocks(blocks: Vec<VisualBlock>, width: f32, height: f32) -> Self {
        let index = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.note, i))
            .collect();
        Self {
            blocks,
            index,
            width,
            height,
        }
    }

    /// Board size for the host to size its surface.
    pub fn board_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[VisualBlock] {
        &self.blocks
    }

    pub fn block(&self, note: &NoteName) -> Option<&VisualBlock> {
        self.index.get(note).map(|&i| &self.blocks[i])
    }

    pub fn block_mut(&mut self, note: &NoteName) -> Option<&mut VisualBlock> {
        let i = *self.index.get(note)?;
        self.blocks.get_mut(i)
    }

    pub fn contains(&self, note: &NoteName) -> bool {
        self.index.contains_key(note)
    }

    pub fn any_flashing(&self) -> bool {
        self.blocks.iter().any(VisualBlock::is_flashing)
    }

    /// Decay pass: `now` is read once per frame by the caller so every block
    /// sees the same instant.
    pub fn update(&mut self, now: Millis) {
        for block in &mut self.blocks {
            block.update(now);
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, background: Color, now: Millis) {
        renderer.begin_frame(background);
        for block in &self.blocks {
            block.draw(renderer, now);
        }
        renderer.end_frame();
    }
}
