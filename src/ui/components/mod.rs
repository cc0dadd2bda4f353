//! Widgets that make up the main window

mod engine_picker;
mod playback_controls;
mod status_bar;
mod text_input;

pub use engine_picker::EnginePicker;
pub use playback_controls::PlaybackControls;
pub use status_bar::{ActivityPanel, StatusBar};
pub use text_input::TextInput;
