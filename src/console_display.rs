use crate::render::{Glyph, Renderer};
use crate::types::*;
use std::io::{self, Write};

/// Terminal columns per white key.
const COLS_PER_KEY: f32 = 4.0;
const ROWS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

/// Renders the board as a truecolor ANSI block picture.
///
/// Board pixels are scaled onto a character grid, one white key per
/// `COLS_PER_KEY` columns. Only every `every`-th frame is printed so the
/// terminal keeps up with a 60 Hz session.
pub struct ConsoleDisplay<W: Write> {
    out: W,
    cols: usize,
    scale_x: f32,
    scale_y: f32,
    grid: Vec<Cell>,
    every: u64,
    count: u64,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn stdout(board_size: (f32, f32), key_width: f32, every: u64) -> Self {
        Self::new(io::stdout(), board_size, key_width, every)
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W, board_size: (f32, f32), key_width: f32, every: u64) -> Self {
        let (w, h) = board_size;
        let scale_x = COLS_PER_KEY / key_width.max(1.0);
        let cols = ((w * scale_x).round() as usize).max(1);
        let blank = Cell {
            ch: ' ',
            fg: BACKGROUND,
            bg: BACKGROUND,
        };
        Self {
            out,
            cols,
            scale_x,
            scale_y: ROWS as f32 / h.max(1.0),
            grid: vec![blank; cols * ROWS],
            every: every.max(1),
            count: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn col(&self, x: f32) -> usize {
        ((x * self.scale_x).round().max(0.0) as usize).min(self.cols)
    }

    fn row(&self, y: f32) -> usize {
        ((y * self.scale_y).round().max(0.0) as usize).min(ROWS)
    }

    fn print(&mut self) -> io::Result<()> {
        if self.count == 1 {
            write!(self.out, "\x1b[2J")?;
        }
        write!(self.out, "\x1b[H")?;
        for row in self.grid.chunks(self.cols) {
            for cell in row {
                write!(
                    self.out,
                    "\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{}",
                    cell.bg.r, cell.bg.g, cell.bg.b, cell.fg.r, cell.fg.g, cell.fg.b, cell.ch
                )?;
            }
            writeln!(self.out, "\x1b[0m")?;
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for ConsoleDisplay<W> {
    fn begin_frame(&mut self, background: Color) {
        for cell in &mut self.grid {
            *cell = Cell {
                ch: ' ',
                fg: background,
                bg: background,
            };
        }
    }

    fn draw_rect(&mut self, bounds: Rect, color: Color) {
        let (c0, c1) = (self.col(bounds.x), self.col(bounds.right()));
        let (r0, r1) = (self.row(bounds.y), self.row(bounds.bottom()));
        for r in r0..r1 {
            for c in c0..c1 {
                // Right edge doubles as the gap between neighbouring keys
                let ch = if c + 1 == c1 && c1 - c0 > 1 { '▕' } else { ' ' };
                self.grid[r * self.cols + c] = Cell {
                    ch,
                    fg: BACKGROUND,
                    bg: color,
                };
            }
        }
    }

    fn blit_glyph(&mut self, glyph: &Glyph, x: f32, y: f32) {
        let r = self.row(y);
        if r >= ROWS {
            return;
        }
        let c0 = self.col(x);
        for (i, ch) in glyph.text.chars().enumerate() {
            let c = c0 + i;
            if c >= self.cols {
                break;
            }
            let cell = &mut self.grid[r * self.cols + c];
            cell.ch = ch;
            cell.fg = glyph.color;
        }
    }

    fn end_frame(&mut self) {
        self.count += 1;
        if (self.count - 1) % self.every == 0 {
            // A closed terminal is not worth stopping the piano for.
            let _ = self.print();
        }
    }
}
