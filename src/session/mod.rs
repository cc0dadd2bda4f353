//! Playback session: engine selection and the play/stop lifecycle

pub mod controller;
pub mod state;

pub use controller::PlaybackController;
pub use state::{PlaybackState, SessionEvent};
