use crate::bindings::resolve_note;
use crate::keyboard::KeyboardState;
use crate::library::{SampleHandle, SampleLibrary};
use crate::note::NoteName;
use crate::types::*;
use log::{debug, info};

/// Playback port. Called on the session thread; implementations that talk to
/// an audio device hand the sample off without blocking.
pub trait AudioSink {
    fn play(&mut self, note: NoteName, sample: &SampleHandle);
}

/// Sink that drops everything. Used when audio output is disabled.
#[derive(Debug, Default)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&mut self, _note: NoteName, _sample: &SampleHandle) {}
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn play(&mut self, note: NoteName, sample: &SampleHandle) {
        (**self).play(note, sample)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// Neither the requested note nor its natural form has a sample.
    #[error("no sample for {0} or its natural")]
    UnknownNote(NoteName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Key is not bound to a note.
    Ignored,
    Played {
        /// Note the key press asked for.
        requested: NoteName,
        /// Note whose sample actually sounded.
        played: NoteName,
        /// Block that lit up, if any.
        flashed: Option<NoteName>,
    },
}

/// Key press → note → sample (with sharp fallback) → playback + flash.
///
/// Flash length is owned by each block, so expiry and fade always agree.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteTriggerEngine;

impl NoteTriggerEngine {
    pub fn new() -> Self {
        Self
    }

    /// Handle one key-down at `now`.
    ///
    /// A sharp with no sample falls back to its natural's sample. The flash
    /// goes to the requested note's block when there is one, else to the
    /// natural's block. Exactly one sample is played per successful trigger.
    pub fn trigger(
        &self,
        event: KeyEvent,
        now: Millis,
        library: &SampleLibrary,
        keyboard: &mut KeyboardState,
        sink: &mut dyn AudioSink,
    ) -> Result<TriggerOutcome, TriggerError> {
        let Some(requested) = resolve_note(event.key, event.shift) else {
            return Ok(TriggerOutcome::Ignored);
        };

        let (played, sample) = match library.get_note(&requested) {
            Some(sample) => (requested, sample),
            None if requested.sharp => {
                let natural = requested.naturalize();
                match library.get_note(&natural) {
                    Some(sample) => {
                        debug!("{} has no sample, falling back to {}", requested, natural);
                        (natural, sample)
                    }
                    None => return Err(TriggerError::UnknownNote(requested)),
                }
            }
            None => return Err(TriggerError::UnknownNote(requested)),
        };

        info!("{}", played);
        sink.play(played, sample);

        let target = [requested, played]
            .into_iter()
            .find(|note| keyboard.contains(note));
        match target.and_then(|note| keyboard.block_mut(&note)) {
            Some(block) => block.flash_from(now),
            None => debug!("No block to flash for {}", requested),
        }

        Ok(TriggerOutcome::Played {
            requested,
            played,
            flashed: target,
        })
    }
}
