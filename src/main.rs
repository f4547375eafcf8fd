use key_piano::bindings::playable_notes;
use key_piano::console_display::ConsoleDisplay;
use key_piano::keyboard_input::KeyboardReader;
use key_piano::library::SampleLibrary;
use key_piano::render::FrameRecorder;
use key_piano::session::PianoSession;
use key_piano::settings::Settings;
use key_piano::simulator::{self, Simulator};
use key_piano::trigger::{AudioSink, SilentSink};
use key_piano::types::*;
#[cfg(feature = "audio")]
use key_piano::audio_output::CpalSink;
#[cfg(feature = "gui")]
use key_piano::webview_app;

use clap::{Parser, ValueEnum};
use crossbeam_channel::bounded;
use log::{error, info, warn};
use std::path::PathBuf;
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputSource {
    /// Characters typed on the terminal
    Stdin,
    /// A scripted demo performance
    Demo,
}

#[derive(Parser)]
#[command(name = "key-piano")]
#[command(about = "Play piano samples from the computer keyboard")]
struct Cli {
    /// Directory of <NOTE>.wav samples (e.g. C4.wav, C#4.wav)
    #[arg(long, default_value = "sound")]
    sounds: PathBuf,

    /// Use synthesized tones for every bound note instead of a sample directory
    #[arg(long)]
    tones: bool,

    /// JSON settings file (geometry, timing, palette)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to this file and continue
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Frame rate (Hz), overrides the settings file
    #[arg(long)]
    fps: Option<u32>,

    /// Flash fade duration (ms), overrides the settings file
    #[arg(long)]
    flash_ms: Option<u64>,

    /// Where key presses come from in headless mode
    #[arg(long, value_enum, default_value_t = InputSource::Stdin)]
    input: InputSource,

    /// Demo to play with --input demo: "scale" (default), "chromatic" or "twinkle"
    #[arg(long, default_value = "scale")]
    demo: String,

    /// Demo playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Disable the terminal keyboard picture
    #[arg(long)]
    no_console: bool,

    /// Print every Nth frame to the terminal
    #[arg(long, default_value_t = 6)]
    console_every: u64,

    /// Open the native window (needs the "gui" feature)
    #[arg(long)]
    gui: bool,

    /// Do not open an audio device
    #[arg(long)]
    mute: bool,
}

fn open_sink(mute: bool) -> Box<dyn AudioSink> {
    if mute {
        info!("Audio muted");
        return Box::new(SilentSink);
    }
    #[cfg(feature = "audio")]
    {
        match CpalSink::start() {
            Ok(sink) => return Box::new(sink),
            Err(e) => warn!("Audio unavailable ({}), running silent", e),
        }
    }
    #[cfg(not(feature = "audio"))]
    warn!("Built without the 'audio' feature, running silent");
    Box::new(SilentSink)
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let clock = SessionClock::new();

    // ─── Settings: file, then command line ──────────────────────────
    let mut settings = match &cli.settings {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Some(fps) = cli.fps {
        settings.frame_rate_hz = fps;
    }
    if let Some(ms) = cli.flash_ms {
        settings.flash_ms = ms;
    }
    if let Some(path) = &cli.save_settings {
        if let Err(e) = settings.save(path) {
            error!("Could not write settings to {:?}: {}", path, e);
        }
    }

    let gui_enabled = cfg!(feature = "gui") && cli.gui;
    if cli.gui && !gui_enabled {
        warn!("Built without the 'gui' feature, running headless");
    }

    info!("═══════════════════════════════════════════════");
    info!("  KEY PIANO v{}", env!("CARGO_PKG_VERSION"));
    if cli.tones {
        info!("  Sounds: synthesized tones");
    } else {
        info!("  Sounds: {:?}", cli.sounds);
    }
    info!("  Flash: {} ms  Frame rate: {} Hz", settings.flash_ms, settings.frame_rate_hz);
    if gui_enabled {
        info!("  UI: WebView (wry)");
    } else if !cli.no_console {
        info!("  UI: Console");
    }
    info!("═══════════════════════════════════════════════");

    // ─── Sample library ─────────────────────────────────────────────
    let library = if cli.tones {
        SampleLibrary::synthesized(playable_notes(), 44_100)
    } else {
        match SampleLibrary::load_dir(&cli.sounds) {
            Ok(lib) => lib,
            Err(e) => {
                error!("Could not load samples: {}", e);
                error!("Pass --sounds <dir> or --tones");
                std::process::exit(1);
            }
        }
    };
    info!("Loaded {} samples", library.len());

    let sink = open_sink(cli.mute);
    let mut session = match PianoSession::new(library, settings, sink) {
        Ok(s) => s,
        Err(e) => {
            error!("Cannot start: {}", e);
            std::process::exit(1);
        }
    };

    // ─── Launch WebView on main thread (never returns) ──────────────
    #[cfg(feature = "gui")]
    if gui_enabled {
        webview_app::run(session, clock);
    }

    // ─── Input source ───────────────────────────────────────────────
    let (input_tx, input_rx) = bounded::<InputEvent>(1024);
    let spawned = match cli.input {
        InputSource::Stdin => thread::Builder::new()
            .name("keyboard".into())
            .spawn(move || KeyboardReader::stdin(input_tx).run()),
        InputSource::Demo => {
            if simulator::demo_sequence(&cli.demo).is_none() {
                warn!("Unknown demo {:?} (have: {:?})", cli.demo, simulator::DEMOS);
            }
            let demo = cli.demo.clone();
            let speed = cli.speed;
            thread::Builder::new()
                .name("simulator".into())
                .spawn(move || Simulator::new(input_tx).with_speed(speed).run(&demo))
        }
    };
    if let Err(e) = spawned {
        error!("Failed to start input thread: {}", e);
        std::process::exit(1);
    }

    // ─── Headless frame loop ────────────────────────────────────────
    if cli.no_console {
        let mut recorder = FrameRecorder::new();
        session.run(&input_rx, &clock, &mut recorder);
    } else {
        let key_width = session.settings().key_width;
        let mut display =
            ConsoleDisplay::stdout(session.board_size(), key_width, cli.console_every);
        session.run(&input_rx, &clock, &mut display);
    }
}
