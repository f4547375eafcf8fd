//! End-to-end integration tests for the key piano pipeline.
//!
//! These tests exercise the full data flow:
//!   input source → InputEvent channel → PianoSession → sink + renderer
//!
//! Sessions run against a recording audio sink and a recording renderer, so
//! every assertion is about what would have been heard and seen.

use crossbeam_channel::bounded;
use std::io::Cursor;
use std::thread;

use key_piano::bindings::{playable_notes, KeyCode};
use key_piano::block::FlashState;
use key_piano::keyboard_input::KeyboardReader;
use key_piano::library::{SampleHandle, SampleLibrary};
use key_piano::note::NoteName;
use key_piano::render::FrameRecorder;
use key_piano::session::PianoSession;
use key_piano::settings::Settings;
use key_piano::simulator::Simulator;
use key_piano::trigger::AudioSink;
use key_piano::types::*;

// ─── Helpers ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    played: Vec<String>,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, note: NoteName, _sample: &SampleHandle) {
        self.played.push(note.encode());
    }
}

fn note(s: &str) -> NoteName {
    s.parse().unwrap()
}

fn session_with(names: &[&str], settings: Settings) -> PianoSession<RecordingSink> {
    let lib = SampleLibrary::synthesized(names.iter().map(|s| note(s)), 8000);
    PianoSession::new(lib, settings, RecordingSink::default()).unwrap()
}

fn session(names: &[&str]) -> PianoSession<RecordingSink> {
    session_with(names, Settings::default())
}

fn press(key: KeyCode, shift: bool) -> KeyEvent {
    KeyEvent::new(key, shift)
}

fn expiry(s: &PianoSession<RecordingSink>, name: &str) -> Option<Millis> {
    match s.keyboard().block(&note(name))?.flash_state() {
        FlashState::Flashing { expiry } => Some(expiry),
        FlashState::Resting => None,
    }
}

// ─── Trigger behaviour ─────────────────────────────────────────────────────

#[test]
fn test_shift_plays_sharp_and_plain_plays_natural() {
    let mut s = session(&["C2", "C#2"]);
    let mut rec = FrameRecorder::new();
    let t = 10_000;

    s.frame(t, [press(KeyCode::Digit1, true)], &mut rec);
    assert_eq!(s.sink().played, ["C#2"]);
    assert_eq!(expiry(&s, "C#2"), Some(t + FLASH_DURATION_MS));
    assert_eq!(expiry(&s, "C2"), None);

    s.frame(t + 16, [press(KeyCode::Digit1, false)], &mut rec);
    assert_eq!(s.sink().played, ["C#2", "C2"]);
    assert_eq!(expiry(&s, "C2"), Some(t + 16 + FLASH_DURATION_MS));
    // The sharp keeps fading on its own clock
    assert_eq!(expiry(&s, "C#2"), Some(t + FLASH_DURATION_MS));
}

#[test]
fn test_missing_sharp_falls_back_to_natural() {
    let mut s = session(&["C2", "D2"]);
    let mut rec = FrameRecorder::new();

    s.frame(0, [press(KeyCode::Digit1, true)], &mut rec);
    assert_eq!(s.sink().played, ["C2"]);
    assert_eq!(expiry(&s, "C2"), Some(FLASH_DURATION_MS));
    assert_eq!(s.stats().fallbacks, 1);
}

#[test]
fn test_retrigger_restarts_the_fade() {
    let mut s = session(&["C2"]);
    let mut rec = FrameRecorder::new();
    let bounds = s.keyboard().block(&note("C2")).unwrap().bounds;

    s.frame(0, [press(KeyCode::Digit1, false)], &mut rec);
    s.frame(3000, [], &mut rec);
    assert_ne!(rec.color_at(bounds), Some(FLASH_ACCENT));

    s.frame(3000, [press(KeyCode::Digit1, false)], &mut rec);
    assert_eq!(rec.color_at(bounds), Some(FLASH_ACCENT));
    assert_eq!(expiry(&s, "C2"), Some(3000 + FLASH_DURATION_MS));

    s.frame(3000 + FLASH_DURATION_MS, [], &mut rec);
    assert_eq!(rec.color_at(bounds), Some(WHITE_KEY_REST));
    assert_eq!(expiry(&s, "C2"), None);
}

#[test]
fn test_bad_presses_do_not_disturb_the_board() {
    let mut s = session(&["C2"]);
    let mut rec = FrameRecorder::new();

    // Unbound key, then a bound key with no sample at all
    s.frame(
        0,
        [press(KeyCode::Minus, false), press(KeyCode::Digit2, false)],
        &mut rec,
    );
    assert!(s.sink().played.is_empty());
    assert!(!s.keyboard().any_flashing());
    assert_eq!(s.stats().ignored, 1);
    assert_eq!(s.stats().unknown, 1);
    assert_eq!(rec.frames(), 1);
}

#[test]
fn test_black_keys_draw_over_white_keys() {
    let mut s = session(&["C2", "C#2", "D2"]);
    let mut rec = FrameRecorder::new();
    s.frame(0, [], &mut rec);

    let black = s.keyboard().block(&note("C#2")).unwrap().bounds;
    assert_eq!(black.x, KEY_WIDTH / 2.0);
    assert_eq!(rec.color_at(black), Some(BLACK_KEY_REST));
    assert_eq!(s.board_size(), (2.0 * KEY_WIDTH, KEY_HEIGHT));
}

#[test]
fn test_full_board_fits_inside_its_width() {
    let mut notes = playable_notes();
    // A stray sharp above the top binding must not widen or overflow the board
    notes.push(note("C#7"));
    let lib = SampleLibrary::synthesized(notes, 8000);
    let s = PianoSession::new(lib, Settings::default(), RecordingSink::default()).unwrap();

    let (width, _) = s.board_size();
    assert_eq!(width, 36.0 * KEY_WIDTH);
    assert_eq!(s.keyboard().len(), 36 + 25);
    for b in s.keyboard().blocks() {
        assert!(b.bounds.right() <= width, "{} ends at {}", b.note, b.bounds.right());
    }
}

#[test]
fn test_short_flash_setting_fades_linearly() {
    let settings = Settings {
        flash_ms: 1000,
        ..Settings::default()
    };
    let mut s = session_with(&["C2"], settings);
    let mut rec = FrameRecorder::new();
    let bounds = s.keyboard().block(&note("C2")).unwrap().bounds;

    s.frame(0, [press(KeyCode::Digit1, false)], &mut rec);
    assert_eq!(expiry(&s, "C2"), Some(1000));
    s.frame(500, [], &mut rec);
    assert_eq!(rec.color_at(bounds), Some(WHITE_KEY_REST.lerp(FLASH_ACCENT, 0.5)));
    s.frame(1000, [], &mut rec);
    assert_eq!(rec.color_at(bounds), Some(WHITE_KEY_REST));
}

// ─── Full pipeline ─────────────────────────────────────────────────────────

#[test]
fn test_typed_input_through_channel() {
    let mut s = session(&["C2", "C#2", "C3"]);
    let (tx, rx) = bounded::<InputEvent>(64);

    let reader = thread::Builder::new()
        .name("test-keyboard".into())
        .spawn(move || KeyboardReader::new(Cursor::new("1!8-\n:quit\n"), tx).run())
        .unwrap();

    let mut rec = FrameRecorder::new();
    let stats = s.run(&rx, &SessionClock::new(), &mut rec);
    reader.join().unwrap();

    assert_eq!(s.sink().played, ["C2", "C#2", "C3"]);
    assert_eq!(stats.played, 3);
    assert_eq!(stats.ignored, 1);
    assert!(stats.frames >= 1);
    // Quit returns immediately, the flashes are still lit
    assert!(s.keyboard().any_flashing());
}

#[test]
fn test_demo_runs_until_flashes_fade() {
    let settings = Settings {
        flash_ms: 40,
        frame_rate_hz: 200,
        ..Settings::default()
    };
    let names = [
        "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4", "C5",
    ];
    let mut s = session_with(&names, settings);
    let (tx, rx) = bounded::<InputEvent>(64);

    let sim = thread::Builder::new()
        .name("test-simulator".into())
        .spawn(move || Simulator::new(tx).with_speed(1000.0).run("chromatic"))
        .unwrap();

    let mut rec = FrameRecorder::new();
    let stats = s.run(&rx, &SessionClock::new(), &mut rec);
    sim.join().unwrap();

    assert_eq!(s.sink().played, names);
    assert_eq!(stats.fallbacks, 0);
    assert!(!s.keyboard().any_flashing());
    assert!(rec.frames() >= 2);
}
