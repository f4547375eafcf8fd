//! Note names: `C2`, `C#2`, ... parsed into a typed value and back.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Natural note letter. Declaration order is pitch order within an octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub fn from_char(c: char) -> Option<Letter> {
        match c {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }

    /// Position in C, D, E, F, G, A, B.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Semitones above C in the same octave.
    pub fn semitone(self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// E and B have no sharp key on a piano.
    pub fn has_sharp(self) -> bool {
        !matches!(self, Letter::E | Letter::B)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error("malformed note name {0:?}: expected <letter><octave> or <letter>#<octave>")]
    Malformed(String),
    #[error("note {0} is already sharp")]
    AlreadySharp(NoteName),
}

/// Canonical note identity. Compared and hashed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    pub letter: Letter,
    pub octave: u8,
    pub sharp: bool,
}

impl NoteName {
    pub const fn natural(letter: Letter, octave: u8) -> Self {
        Self {
            letter,
            octave,
            sharp: false,
        }
    }

    pub fn decode(s: &str) -> Result<NoteName, NoteError> {
        let malformed = || NoteError::Malformed(s.to_string());
        let chars: Vec<char> = s.chars().collect();
        let (letter, sharp, octave) = match chars.as_slice() {
            [l, o] => (*l, false, *o),
            [l, '#', o] => (*l, true, *o),
            _ => return Err(malformed()),
        };
        let letter = Letter::from_char(letter).ok_or_else(malformed)?;
        let octave = octave.to_digit(10).ok_or_else(malformed)? as u8;
        Ok(NoteName {
            letter,
            octave,
            sharp,
        })
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn sharpen(self) -> Result<NoteName, NoteError> {
        if self.sharp {
            return Err(NoteError::AlreadySharp(self));
        }
        Ok(NoteName { sharp: true, ..self })
    }

    pub fn naturalize(self) -> NoteName {
        NoteName {
            sharp: false,
            ..self
        }
    }

    /// Sort key for the keyboard: octave first, then letter within the octave.
    /// A sharp sorts right after its natural.
    pub fn pitch_key(&self) -> (u8, u8, bool) {
        (self.octave, self.letter.index(), self.sharp)
    }

    /// MIDI note number. C4 = 60.
    pub fn midi(&self) -> u8 {
        (self.octave + 1) * 12 + self.letter.semitone() + self.sharp as u8
    }

    /// Equal-tempered frequency in Hz.
    pub fn frequency_hz(&self) -> f64 {
        midi_to_hz(self.midi() as f64)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sharp {
            write!(f, "{}#{}", self.letter.as_char(), self.octave)
        } else {
            write!(f, "{}{}", self.letter.as_char(), self.octave)
        }
    }
}

impl FromStr for NoteName {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteName::decode(s)
    }
}

impl PartialOrd for NoteName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NoteName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pitch_key().cmp(&other.pitch_key())
    }
}

/// Convert MIDI note number (fractional) to Hz. A4 = MIDI 69 = 440 Hz.
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_natural_and_sharp() {
        let c2 = NoteName::decode("C2").unwrap();
        assert_eq!(c2, NoteName::natural(Letter::C, 2));

        let cs2 = NoteName::decode("C#2").unwrap();
        assert_eq!(cs2.letter, Letter::C);
        assert_eq!(cs2.octave, 2);
        assert!(cs2.sharp);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in ["", "C", "H2", "c2", "C#", "Cb2", "C##2", "C22", "2C", "C 2", "é2"] {
            assert!(
                matches!(NoteName::decode(bad), Err(NoteError::Malformed(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_matches_input() {
        for s in ["C2", "C#2", "A4", "G#6", "B6", "C7"] {
            assert_eq!(NoteName::decode(s).unwrap().encode(), s);
        }
    }

    #[test]
    fn test_bound_notes_round_trip() {
        use crate::bindings::BINDINGS;
        for (_, natural) in BINDINGS {
            assert_eq!(NoteName::decode(&natural.encode()), Ok(natural));
            if natural.letter.has_sharp() {
                let sharp = natural.sharpen().unwrap();
                assert_eq!(NoteName::decode(&sharp.encode()), Ok(sharp));
            }
        }
    }

    #[test]
    fn test_sharpen_and_naturalize() {
        let f3 = NoteName::natural(Letter::F, 3);
        let fs3 = f3.sharpen().unwrap();
        assert_eq!(fs3.encode(), "F#3");
        assert_eq!(fs3.naturalize(), f3);
        assert_eq!(f3.naturalize(), f3);
        assert_eq!(fs3.sharpen(), Err(NoteError::AlreadySharp(fs3)));
    }

    #[test]
    fn test_pitch_order_octave_then_letter() {
        let mut names: Vec<NoteName> = ["C3", "B2", "A2", "C#2", "C2", "G2"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        names.sort();
        let sorted: Vec<String> = names.iter().map(NoteName::encode).collect();
        assert_eq!(sorted, ["C2", "C#2", "G2", "A2", "B2", "C3"]);
    }

    #[test]
    fn test_midi_and_frequency() {
        assert_eq!(NoteName::decode("C4").unwrap().midi(), 60);
        assert_eq!(NoteName::decode("C#4").unwrap().midi(), 61);
        assert_eq!(NoteName::decode("C2").unwrap().midi(), 36);
        assert!((NoteName::decode("A4").unwrap().frequency_hz() - 440.0).abs() < 1e-9);
    }
}
