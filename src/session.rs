use crate::keyboard::KeyboardState;
use crate::layout::{layout_board, LayoutError};
use crate::library::SampleLibrary;
use crate::render::{MonoFont, Renderer};
use crate::settings::Settings;
use crate::trigger::{AudioSink, NoteTriggerEngine, TriggerOutcome};
use crate::types::*;
use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

/// Running counters, logged periodically and at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub played: u64,
    pub fallbacks: u64,
    pub ignored: u64,
    pub unknown: u64,
}

/// The piano session: owns the sample library, the board and the audio sink.
///
/// Each frame runs three passes against one clock reading: trigger every
/// pending key press, decay all flashes, draw. Input sources never touch
/// block state; they only send [`InputEvent`]s.
pub struct PianoSession<S: AudioSink> {
    library: SampleLibrary,
    keyboard: KeyboardState,
    engine: NoteTriggerEngine,
    sink: S,
    settings: Settings,
    stats: SessionStats,
}

impl<S: AudioSink> PianoSession<S> {
    /// Lay out the board from the library's note names. Fails if there is
    /// nothing to show.
    pub fn new(library: SampleLibrary, settings: Settings, sink: S) -> Result<Self, LayoutError> {
        let font = MonoFont::new(settings.font_size);
        let keyboard = layout_board(library.names(), &settings.layout_config(), &font)?;
        let (w, h) = keyboard.board_size();
        info!(
            "Board: {} keys, {}x{} px, flash {} ms",
            keyboard.len(),
            w,
            h,
            settings.flash_ms
        );
        Ok(Self {
            engine: NoteTriggerEngine::new(),
            library,
            keyboard,
            sink,
            settings,
            stats: SessionStats::default(),
        })
    }

    pub fn board_size(&self) -> (f32, f32) {
        self.keyboard.board_size()
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Trigger pass for one key press. Per-event failures are logged and
    /// dropped; they never stop the frame.
    pub fn handle_key(&mut self, event: KeyEvent, now: Millis) {
        match self
            .engine
            .trigger(event, now, &self.library, &mut self.keyboard, &mut self.sink)
        {
            Ok(TriggerOutcome::Ignored) => {
                self.stats.ignored += 1;
                debug!("Unbound key {:?}", event.key);
            }
            Ok(TriggerOutcome::Played {
                requested, played, ..
            }) => {
                self.stats.played += 1;
                if requested != played {
                    self.stats.fallbacks += 1;
                }
            }
            Err(e) => {
                self.stats.unknown += 1;
                warn!("Dropping key {:?}: {}", event.key, e);
            }
        }
    }

    /// One frame at `now`: key presses, then decay, then draw.
    pub fn frame<I>(&mut self, now: Millis, events: I, renderer: &mut dyn Renderer)
    where
        I: IntoIterator<Item = KeyEvent>,
    {
        for event in events {
            self.handle_key(event, now);
        }
        self.keyboard.update(now);
        self.keyboard
            .draw(renderer, self.settings.palette.background, now);

        self.stats.frames += 1;
        if self.stats.frames % 600 == 0 {
            debug!("Session: {:?}", self.stats);
        }
    }

    /// Frame loop at the configured rate. Returns on [`InputEvent::Quit`],
    /// or once the input channel has closed and every flash has faded.
    pub fn run(
        &mut self,
        rx: &Receiver<InputEvent>,
        clock: &SessionClock,
        renderer: &mut dyn Renderer,
    ) -> SessionStats {
        let mut pacer = FramePacer::new(self.settings.frame_interval_ms());
        let mut input_closed = false;
        info!("Session running at {} Hz", self.settings.frame_rate_hz);

        loop {
            let mut keys = Vec::new();
            let mut quit = false;
            loop {
                match rx.try_recv() {
                    Ok(InputEvent::Key(k)) => keys.push(k),
                    Ok(InputEvent::Quit) => {
                        quit = true;
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        input_closed = true;
                        break;
                    }
                }
            }

            let now = clock.now_ms();
            self.frame(now, keys, renderer);

            if quit {
                info!("Quit requested");
                break;
            }
            if input_closed && !self.keyboard.any_flashing() {
                info!("Input closed and all keys at rest");
                break;
            }
            pacer.wait();
        }

        info!(
            "Session finished: {} frames, {} played ({} via fallback), {} ignored, {} unknown",
            self.stats.frames,
            self.stats.played,
            self.stats.fallbacks,
            self.stats.ignored,
            self.stats.unknown
        );
        self.stats
    }
}

/// Sleeps until the next frame boundary. Never sleeps longer than one
/// interval; a late frame starts the next one immediately.
pub struct FramePacer {
    interval: Duration,
    next: Instant,
}

impl FramePacer {
    pub fn new(interval_ms: Millis) -> Self {
        let interval = Duration::from_millis(interval_ms.max(1));
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.interval;
        } else {
            self.next = now + self.interval;
        }
    }
}
