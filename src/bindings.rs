//! Compiled-in key layout: which physical key plays which note, and the
//! character printed on each key block.
//!
//! The layout walks the US keyboard rows left to right (`1`..`0`, `q`..`p`,
//! `a`..`l`, `z`..`m`) up the white keys from C2 to C7. Shift plays the sharp
//! of the bound note; its label is the shifted character of the same key.

use crate::note::{Letter, NoteName};
use crate::types::KeyEvent;

/// Physical key identifiers, named after DOM `KeyboardEvent.code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,
    Space,
    Minus,
    Equal,
    BracketLeft,
    BracketRight,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,
    Enter,
    Unidentified,
}

const fn n(letter: Letter, octave: u8) -> NoteName {
    NoteName::natural(letter, octave)
}

/// Physical key → natural note. Never contains a sharp.
pub const BINDINGS: [(KeyCode, NoteName); 36] = {
    use KeyCode::*;
    use Letter::*;
    [
        (Digit1, n(C, 2)),
        (Digit2, n(D, 2)),
        (Digit3, n(E, 2)),
        (Digit4, n(F, 2)),
        (Digit5, n(G, 2)),
        (Digit6, n(A, 2)),
        (Digit7, n(B, 2)),
        (Digit8, n(C, 3)),
        (Digit9, n(D, 3)),
        (Digit0, n(E, 3)),
        (KeyQ, n(F, 3)),
        (KeyW, n(G, 3)),
        (KeyE, n(A, 3)),
        (KeyR, n(B, 3)),
        (KeyT, n(C, 4)),
        (KeyY, n(D, 4)),
        (KeyU, n(E, 4)),
        (KeyI, n(F, 4)),
        (KeyO, n(G, 4)),
        (KeyP, n(A, 4)),
        (KeyA, n(B, 4)),
        (KeyS, n(C, 5)),
        (KeyD, n(D, 5)),
        (KeyF, n(E, 5)),
        (KeyG, n(F, 5)),
        (KeyH, n(G, 5)),
        (KeyJ, n(A, 5)),
        (KeyK, n(B, 5)),
        (KeyL, n(C, 6)),
        (KeyZ, n(D, 6)),
        (KeyX, n(E, 6)),
        (KeyC, n(F, 6)),
        (KeyV, n(G, 6)),
        (KeyB, n(A, 6)),
        (KeyN, n(B, 6)),
        (KeyM, n(C, 7)),
    ]
};

pub fn base_note_for(key: KeyCode) -> Option<NoteName> {
    BINDINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, note)| *note)
}

/// Key-character label for a playable note: the bound key's character for a
/// natural, its shifted character for a sharp. None outside the compiled range
/// and for sharps that do not exist (E#, B#).
pub fn label_for(note: NoteName) -> Option<char> {
    if note.sharp && !note.letter.has_sharp() {
        return None;
    }
    let (key, _) = BINDINGS.iter().find(|(_, n)| *n == note.naturalize())?;
    key.as_char(note.sharp)
}

/// Every note the bound keys can ask for that gets its own key on the board:
/// each bound natural plus its sharp, except the sharp above the highest
/// binding, which has no white key to its right.
pub fn playable_notes() -> Vec<NoteName> {
    let mut notes = Vec::with_capacity(BINDINGS.len() * 2);
    for (i, (_, natural)) in BINDINGS.iter().enumerate() {
        notes.push(*natural);
        if !natural.letter.has_sharp() || i + 1 == BINDINGS.len() {
            continue;
        }
        if let Ok(sharp) = natural.sharpen() {
            notes.push(sharp);
        }
    }
    notes
}

/// Requested note for a key press, before any sample fallback.
/// None for unbound keys.
pub fn resolve_note(key: KeyCode, shift: bool) -> Option<NoteName> {
    let base = base_note_for(key)?;
    if shift {
        // Bound notes are natural, so sharpen cannot fail here.
        Some(base.sharpen().unwrap_or(base))
    } else {
        Some(base)
    }
}

impl KeyCode {
    /// Character the key types on a US layout, unshifted or shifted.
    pub fn as_char(self, shift: bool) -> Option<char> {
        use KeyCode::*;
        let (plain, shifted) = match self {
            Digit0 => ('0', ')'),
            Digit1 => ('1', '!'),
            Digit2 => ('2', '@'),
            Digit3 => ('3', '#'),
            Digit4 => ('4', '$'),
            Digit5 => ('5', '%'),
            Digit6 => ('6', '^'),
            Digit7 => ('7', '&'),
            Digit8 => ('8', '*'),
            Digit9 => ('9', '('),
            Space => (' ', ' '),
            Minus => ('-', '_'),
            Equal => ('=', '+'),
            BracketLeft => ('[', '{'),
            BracketRight => (']', '}'),
            Semicolon => (';', ':'),
            Quote => ('\'', '"'),
            Comma => (',', '<'),
            Period => ('.', '>'),
            Slash => ('/', '?'),
            Enter | Unidentified => return None,
            letter => {
                let c = letter.letter_char()?;
                (c, c.to_ascii_uppercase())
            }
        };
        Some(if shift { shifted } else { plain })
    }

    fn letter_char(self) -> Option<char> {
        use KeyCode::*;
        let c = match self {
            KeyA => 'a',
            KeyB => 'b',
            KeyC => 'c',
            KeyD => 'd',
            KeyE => 'e',
            KeyF => 'f',
            KeyG => 'g',
            KeyH => 'h',
            KeyI => 'i',
            KeyJ => 'j',
            KeyK => 'k',
            KeyL => 'l',
            KeyM => 'm',
            KeyN => 'n',
            KeyO => 'o',
            KeyP => 'p',
            KeyQ => 'q',
            KeyR => 'r',
            KeyS => 's',
            KeyT => 't',
            KeyU => 'u',
            KeyV => 'v',
            KeyW => 'w',
            KeyX => 'x',
            KeyY => 'y',
            KeyZ => 'z',
            _ => return None,
        };
        Some(c)
    }

    /// Decode a DOM `KeyboardEvent.code` string.
    pub fn from_dom_code(code: &str) -> KeyCode {
        use KeyCode::*;
        if let Some(rest) = code.strip_prefix("Key") {
            let mut chars = rest.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return KeyCode::from_char(c.to_ascii_lowercase()).key;
            }
            return Unidentified;
        }
        if let Some(rest) = code.strip_prefix("Digit") {
            let mut chars = rest.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return KeyCode::from_char(c).key;
            }
            return Unidentified;
        }
        match code {
            "Space" => Space,
            "Minus" => Minus,
            "Equal" => Equal,
            "BracketLeft" => BracketLeft,
            "BracketRight" => BracketRight,
            "Semicolon" => Semicolon,
            "Quote" => Quote,
            "Comma" => Comma,
            "Period" => Period,
            "Slash" => Slash,
            "Enter" | "NumpadEnter" => Enter,
            _ => Unidentified,
        }
    }

    /// Decode a typed character into the key press that produces it on a US
    /// layout. Uppercase letters and shifted symbols carry `shift`.
    pub fn from_char(c: char) -> KeyEvent {
        const ALL: [KeyCode; 47] = {
            use KeyCode::*;
            [
                Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
                KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
                KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
                Space, Minus, Equal, BracketLeft, BracketRight, Semicolon, Quote, Comma, Period,
                Slash, Enter,
            ]
        };
        if c == '\n' || c == '\r' {
            return KeyEvent::new(KeyCode::Enter, false);
        }
        for key in ALL {
            if key.as_char(false) == Some(c) {
                return KeyEvent::new(key, false);
            }
            if key.as_char(true) == Some(c) {
                return KeyEvent::new(key, true);
            }
        }
        KeyEvent::new(KeyCode::Unidentified, false)
    }
}
