use crate::bindings::KeyCode;
use crate::types::*;
use crossbeam_channel::Sender;
use log::{debug, error, info};
use std::io::{self, BufRead};

/// Line typed to end the session.
pub const QUIT_COMMAND: &str = ":quit";

/// Reads typed characters and forwards each one as a key press.
///
/// A terminal in cooked mode delivers whole lines, so every non-blank
/// character of a line counts as one discrete press, in order. Uppercase
/// letters and shifted symbols arrive with `shift` set, which is how sharps
/// are played from a terminal.
pub struct KeyboardReader<R: BufRead> {
    reader: R,
    tx: Sender<InputEvent>,
}

impl KeyboardReader<io::StdinLock<'static>> {
    pub fn stdin(tx: Sender<InputEvent>) -> Self {
        Self::new(io::stdin().lock(), tx)
    }
}

impl<R: BufRead> KeyboardReader<R> {
    pub fn new(reader: R, tx: Sender<InputEvent>) -> Self {
        Self { reader, tx }
    }

    /// Run until end of input, `:quit`, or the session goes away.
    /// Blocks the calling thread.
    pub fn run(mut self) {
        info!("Type keys and press Enter to play ({} to exit)", QUIT_COMMAND);
        let mut line = String::new();
        let mut presses: u64 = 0;
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            }

            if line.trim() == QUIT_COMMAND {
                let _ = self.tx.send(InputEvent::Quit);
                break;
            }

            for event in parse_line(&line) {
                presses += 1;
                if self.tx.send(InputEvent::Key(event)).is_err() {
                    // Session shut down
                    return;
                }
            }
        }
        debug!("Keyboard reader done after {} presses", presses);
    }
}

/// Key presses for one typed line. Whitespace is skipped.
pub fn parse_line(line: &str) -> Vec<KeyEvent> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(KeyCode::from_char)
        .collect()
}
