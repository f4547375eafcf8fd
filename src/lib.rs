pub mod bindings;
pub mod block;
pub mod console_display;
pub mod keyboard;
pub mod keyboard_input;
pub mod layout;
pub mod library;
pub mod note;
pub mod render;
pub mod session;
pub mod settings;
pub mod simulator;
pub mod trigger;
pub mod types;

#[cfg(feature = "audio")]
pub mod audio_output;

#[cfg(feature = "gui")]
pub mod webview_app;
