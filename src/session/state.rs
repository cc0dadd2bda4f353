//! Playback lifecycle state
//!
//! The controller is the only writer. The UI and tests read snapshots through
//! `PlaybackController::state` and follow transitions through `SessionEvent`s.

use crate::SpeakError;

/// Where the session is in the synthesize/play lifecycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing requested yet, or the last playback finished
    #[default]
    Idle,
    /// A backend is producing audio
    Synthesizing,
    /// Audio is coming out of the speakers
    Playing,
    /// The user (or a newer request) interrupted the last job
    Stopped,
    /// The last job failed; carries a short reason
    Failed(String),
}

impl PlaybackState {
    /// A job is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, PlaybackState::Synthesizing | PlaybackState::Playing)
    }

    /// Nothing in flight; `Failed` behaves like `Stopped` from here on
    pub fn is_resting(&self) -> bool {
        !self.is_busy()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_synthesizing(&self) -> bool {
        matches!(self, PlaybackState::Synthesizing)
    }

    /// Failure reason, if the last job failed
    pub fn failure(&self) -> Option<&str> {
        match self {
            PlaybackState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Synthesizing => write!(f, "Synthesizing"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// Notifications from the controller
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The playback state moved
    StateChanged(PlaybackState),
    /// A job failed; the state is already `Failed`
    Error(SpeakError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_states() {
        assert!(PlaybackState::Synthesizing.is_busy());
        assert!(PlaybackState::Playing.is_busy());
        assert!(PlaybackState::Idle.is_resting());
        assert!(PlaybackState::Stopped.is_resting());
        assert!(PlaybackState::Failed("timeout".into()).is_resting());
    }

    #[test]
    fn test_failure_reason() {
        assert_eq!(PlaybackState::Failed("timeout".into()).failure(), Some("timeout"));
        assert_eq!(PlaybackState::Playing.failure(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PlaybackState::default().to_string(), "Idle");
        assert_eq!(
            PlaybackState::Failed("timeout".into()).to_string(),
            "Failed: timeout"
        );
    }
}
