//! Sample library: note name → decoded sound.
//!
//! Loaded from a directory of WAV files named after their note (`C2.wav`,
//! `C#2.wav`, ...) or synthesized as plain tones when no recordings are at
//! hand. The library may be sparse; callers must not assume every sharp has
//! a sample.

use crate::note::NoteName;
use hound::{SampleFormat, WavReader};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error("cannot read sound directory {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
}

/// Decoded PCM, interleaved f32 in -1.0–1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SampleBuffer {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Shared handle: playback keeps a reference while a voice is sounding.
pub type SampleHandle = Arc<SampleBuffer>;

#[derive(Debug, Clone, Default)]
pub struct SampleLibrary {
    samples: HashMap<String, SampleHandle>,
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buffers<I, S>(buffers: I) -> Self
    where
        I: IntoIterator<Item = (S, SampleBuffer)>,
        S: Into<String>,
    {
        Self {
            samples: buffers
                .into_iter()
                .map(|(name, buf)| (name.into(), Arc::new(buf)))
                .collect(),
        }
    }

    /// Decode every `.wav` file in `dir`, keyed by file stem. Subdirectories,
    /// other extensions and files that fail to decode are skipped.
    pub fn load_dir(dir: &Path) -> Result<Self, LibraryError> {
        if !dir.is_dir() {
            return Err(LibraryError::NotADirectory(dir.to_path_buf()));
        }
        let entries = std::fs::read_dir(dir).map_err(|source| LibraryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut library = Self::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let is_wav = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
            if !is_wav {
                debug!("Library: skipping {:?} (not a WAV file)", path);
                continue;
            }
            match decode_wav(&path) {
                Ok(buf) if buf.sample_rate == 0 || buf.channels == 0 => {
                    warn!("Library: skipping {:?}: empty format header", path)
                }
                Ok(buf) => {
                    library.insert(stem, buf);
                }
                Err(e) => warn!("Library: skipping {:?}: {}", path, e),
            }
        }

        info!("Loaded {} samples from {:?}", library.len(), dir);
        Ok(library)
    }

    /// A decaying two-partial tone per note at its equal-tempered pitch.
    pub fn synthesized<I>(notes: I, sample_rate: u32) -> Self
    where
        I: IntoIterator<Item = NoteName>,
    {
        let library = Self::from_buffers(
            notes
                .into_iter()
                .map(|note| (note.encode(), synth_tone(note.frequency_hz(), sample_rate))),
        );
        info!("Synthesized {} tones at {} Hz", library.len(), sample_rate);
        library
    }

    pub fn insert(&mut self, name: impl Into<String>, buf: SampleBuffer) {
        self.samples.insert(name.into(), Arc::new(buf));
    }

    pub fn get(&self, name: &str) -> Option<&SampleHandle> {
        self.samples.get(name)
    }

    pub fn get_note(&self, note: &NoteName) -> Option<&SampleHandle> {
        self.get(&note.encode())
    }

    pub fn contains_note(&self, note: &NoteName) -> bool {
        self.get_note(note).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn decode_wav(path: &Path) -> Result<SampleBuffer, hound::Error> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max))
                .collect::<Result<_, _>>()?
        }
    };
    Ok(SampleBuffer {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

const TONE_SECS: f64 = 1.5;
const TONE_DECAY_PER_SEC: f64 = 3.0;
const TONE_ATTACK_SECS: f64 = 0.005;

fn synth_tone(freq: f64, sample_rate: u32) -> SampleBuffer {
    let sr = sample_rate.max(1) as f64;
    let n = (TONE_SECS * sr) as usize;
    let samples = (0..n)
        .map(|i| {
            let t = i as f64 / sr;
            let attack = (t / TONE_ATTACK_SECS).min(1.0);
            let env = attack * (-TONE_DECAY_PER_SEC * t).exp();
            let s = (2.0 * PI * freq * t).sin() + 0.3 * (4.0 * PI * freq * t).sin();
            (0.4 * env * s) as f32
        })
        .collect();
    SampleBuffer {
        samples,
        sample_rate,
        channels: 1,
    }
}
