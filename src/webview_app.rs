use crate::bindings::KeyCode;
use crate::render::FrameRecorder;
use crate::session::PianoSession;
use crate::trigger::AudioSink;
use crate::types::*;
use crossbeam_channel::unbounded;
use log::{error, info, warn};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tao::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use wry::WebViewBuilder;

/// Canvas page. `__drawFrame` replays one frame of recorded draw commands;
/// key-downs are posted back over IPC with repeats filtered out.
const PAGE: &str = r#"<!doctype html>
<html><head><style>
html,body{margin:0;padding:0;overflow:hidden;background:#000}
canvas{display:block}
</style></head>
<body><canvas id="board"></canvas>
<script>
const cv = document.getElementById('board');
const ctx = cv.getContext('2d');
function fit() { cv.width = window.innerWidth; cv.height = window.innerHeight; }
window.addEventListener('resize', fit);
fit();
window.__drawFrame = function (cmds) {
  for (const c of cmds) {
    if (c.op === 'clear') {
      ctx.fillStyle = c.color;
      ctx.fillRect(0, 0, cv.width, cv.height);
    } else if (c.op === 'rect') {
      ctx.fillStyle = c.color;
      ctx.fillRect(c.bounds.x, c.bounds.y, c.bounds.w, c.bounds.h);
    } else if (c.op === 'text') {
      ctx.fillStyle = c.color;
      ctx.font = c.size + 'px monospace';
      ctx.textBaseline = 'top';
      ctx.fillText(c.text, c.x, c.y);
    }
  }
};
window.addEventListener('keydown', function (e) {
  if (e.repeat) return;
  window.ipc.postMessage(JSON.stringify({ code: e.code, shift: e.shiftKey }));
  e.preventDefault();
});
</script></body></html>"#;

/// Key-down posted by the page.
#[derive(Debug, Deserialize)]
struct IpcKey {
    code: String,
    #[serde(default)]
    shift: bool,
}

fn parse_ipc(body: &str) -> Option<KeyEvent> {
    match serde_json::from_str::<IpcKey>(body) {
        Ok(k) => Some(KeyEvent::new(KeyCode::from_dom_code(&k.code), k.shift)),
        Err(e) => {
            warn!("Bad IPC message {:?}: {}", body, e);
            None
        }
    }
}

/// Open a native window sized to the board and run the session inside it.
/// Runs the tao event loop on the current thread and never returns
/// (exits the process when the window is closed).
pub fn run<S: AudioSink + 'static>(mut session: PianoSession<S>, clock: SessionClock) -> ! {
    let event_loop = EventLoop::new();
    let (w, h) = session.board_size();

    let window = match WindowBuilder::new()
        .with_title("Key Piano")
        .with_inner_size(tao::dpi::LogicalSize::new(w as f64, h as f64))
        .with_resizable(false)
        .build(&event_loop)
    {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create window: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, rx) = unbounded::<KeyEvent>();
    let webview = match WebViewBuilder::new()
        .with_html(PAGE)
        .with_ipc_handler(move |req| {
            if let Some(event) = parse_ipc(req.body()) {
                let _ = tx.send(event);
            }
        })
        .build(&window)
    {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to create WebView: {}", e);
            std::process::exit(1);
        }
    };

    let interval = Duration::from_millis(session.settings().frame_interval_ms().max(1));
    let mut next_frame = Instant::now();
    let mut recorder = FrameRecorder::new();
    info!("Window open: {}x{} px", w, h);

    event_loop.run(move |event, _, control_flow| {
        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            let stats = session.stats();
            info!(
                "Window closed: {} frames, {} played, {} ignored",
                stats.frames, stats.played, stats.ignored
            );
            *control_flow = ControlFlow::Exit;
            return;
        }

        let wall = Instant::now();
        if wall >= next_frame {
            let keys: Vec<KeyEvent> = rx.try_iter().collect();
            session.frame(clock.now_ms(), keys, &mut recorder);
            match recorder.to_json() {
                Ok(json) => {
                    if let Err(e) = webview.evaluate_script(&format!("window.__drawFrame({json})"))
                    {
                        warn!("Frame push failed: {}", e);
                    }
                }
                Err(e) => warn!("Frame encode failed: {}", e),
            }
            next_frame = wall + interval;
        }
        *control_flow = ControlFlow::WaitUntil(next_frame);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipc_maps_dom_codes() {
        assert_eq!(
            parse_ipc(r#"{"code":"KeyQ","shift":true}"#),
            Some(KeyEvent::new(KeyCode::KeyQ, true))
        );
        assert_eq!(
            parse_ipc(r#"{"code":"Digit1"}"#),
            Some(KeyEvent::new(KeyCode::Digit1, false))
        );
        assert_eq!(
            parse_ipc(r#"{"code":"F13","shift":false}"#),
            Some(KeyEvent::new(KeyCode::Unidentified, false))
        );
        assert_eq!(parse_ipc("not json"), None);
    }
}
