use crate::bindings::KeyCode;
use crate::types::*;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::thread;
use std::time::Duration;

/// Demo names accepted by [`Simulator::run`].
pub const DEMOS: [&str; 3] = ["scale", "chromatic", "twinkle"];

/// One scripted press: the character typed and how long until the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub ch: char,
    pub hold_ms: Millis,
}

/// Plays scripted performances through the same channel as live input, so a
/// demo exercises exactly the path a player would.
pub struct Simulator {
    tx: Sender<InputEvent>,
    /// Playback speed multiplier; 2.0 plays twice as fast.
    speed: f64,
}

impl Simulator {
    pub fn new(tx: Sender<InputEvent>) -> Self {
        Self { tx, speed: 1.0 }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed.max(0.01);
        self
    }

    /// Play the named demo in real time, then hang up the channel.
    /// Blocks the calling thread.
    pub fn run(&self, demo: &str) {
        let steps = demo_sequence(demo).unwrap_or_else(|| {
            warn!("Unknown demo {:?}, playing \"scale\" (have: {:?})", demo, DEMOS);
            scale()
        });
        info!("Simulator playing {:?}: {} notes", demo, steps.len());

        for step in &steps {
            let event = KeyCode::from_char(step.ch);
            if self.tx.send(InputEvent::Key(event)).is_err() {
                return;
            }
            let hold = (step.hold_ms as f64 / self.speed) as u64;
            thread::sleep(Duration::from_millis(hold));
        }
        info!("Demo complete.");
    }
}

pub fn demo_sequence(name: &str) -> Option<Vec<Step>> {
    match name {
        "scale" => Some(scale()),
        "chromatic" => Some(chromatic()),
        "twinkle" => Some(twinkle()),
        _ => None,
    }
}

fn steps(keys: &str, hold_ms: Millis) -> Vec<Step> {
    keys.chars().map(|ch| Step { ch, hold_ms }).collect()
}

/// C4 major, up and back down.
fn scale() -> Vec<Step> {
    let mut s = steps("tyuiopas", 300);
    s.extend(steps("apoiuyt", 300));
    s
}

/// C4 to C5 in semitones: shift for every sharp.
fn chromatic() -> Vec<Step> {
    steps("tTyYuiIoOpPas", 220)
}

fn twinkle() -> Vec<Step> {
    let mut s = Vec::new();
    for (phrase, last_hold) in [("ttoopp", 900), ("iiuuyy", 900)] {
        s.extend(steps(phrase, 450));
        s.push(Step {
            ch: if phrase.starts_with('t') { 'o' } else { 't' },
            hold_ms: last_hold,
        });
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::resolve_note;
    use crossbeam_channel::unbounded;

    fn notes(steps: &[Step]) -> Vec<String> {
        steps
            .iter()
            .map(|s| {
                let e = KeyCode::from_char(s.ch);
                resolve_note(e.key, e.shift).unwrap().encode()
            })
            .collect()
    }

    #[test]
    fn test_every_demo_uses_bound_keys() {
        for name in DEMOS {
            let seq = demo_sequence(name).unwrap();
            assert!(!seq.is_empty());
            assert_eq!(notes(&seq).len(), seq.len(), "{name}");
        }
    }

    #[test]
    fn test_chromatic_is_semitone_steps() {
        let names = notes(&chromatic());
        assert_eq!(
            names,
            [
                "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4",
                "C5"
            ]
        );
    }

    #[test]
    fn test_twinkle_melody() {
        let names = notes(&twinkle());
        assert_eq!(names[..7], ["C4", "C4", "G4", "G4", "A4", "A4", "G4"]);
        assert_eq!(names[7..], ["F4", "F4", "E4", "E4", "D4", "D4", "C4"]);
    }

    #[test]
    fn test_run_sends_every_step_then_hangs_up() {
        let (tx, rx) = unbounded();
        Simulator::new(tx).with_speed(100.0).run("chromatic");
        let got: Vec<InputEvent> = rx.iter().collect();
        assert_eq!(got.len(), chromatic().len());
        assert_eq!(
            got[1],
            InputEvent::Key(KeyEvent::new(KeyCode::KeyT, true))
        );
    }
}
