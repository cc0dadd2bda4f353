pub mod audio;
pub mod check;
pub mod config;
pub mod session;
pub mod speech;
pub mod ui;

use crate::speech::EngineChoice;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeakError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(EngineChoice),

    #[error("No text-to-speech engine is available")]
    NoEngineAvailable,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Quota error: {0}")]
    QuotaError(String),

    #[error("timeout")]
    Timeout,

    #[error("Voice model not found: {0}")]
    ModelNotFound(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Playback device error: {0}")]
    PlaybackDeviceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("cancelled")]
    Cancelled,
}

impl From<std::io::Error> for SpeakError {
    fn from(e: std::io::Error) -> Self {
        SpeakError::IOError(e.to_string())
    }
}

impl SpeakError {
    /// Check if the session can keep going after this error
    ///
    /// Every error leaves the session usable; this only says whether
    /// retrying the same request (or switching engine) is worth it.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SpeakError::InvalidRequest(_) => true,
            // Missing dependencies need the user to install something
            SpeakError::EngineUnavailable(_) => false,
            SpeakError::NoEngineAvailable => false,
            // Online engine: retry or switch engine
            SpeakError::NetworkError(_) => true,
            SpeakError::QuotaError(_) => true,
            SpeakError::Timeout => true,
            // Offline engine: retry or switch engine
            SpeakError::ModelNotFound(_) => true,
            SpeakError::SynthesisError(_) => true,
            // Fatal for the current request only
            SpeakError::PlaybackDeviceError(_) => true,
            SpeakError::ConfigError(_) => false,
            SpeakError::IOError(_) => false,
            SpeakError::ChannelError(_) => false,
            SpeakError::Cancelled => true,
        }
    }

    /// Short reason stored in `PlaybackState::Failed`
    pub fn reason(&self) -> String {
        match self {
            SpeakError::Timeout => "timeout".to_string(),
            SpeakError::InvalidRequest(msg)
            | SpeakError::NetworkError(msg)
            | SpeakError::QuotaError(msg)
            | SpeakError::ModelNotFound(msg)
            | SpeakError::SynthesisError(msg)
            | SpeakError::PlaybackDeviceError(msg)
            | SpeakError::ConfigError(msg)
            | SpeakError::IOError(msg)
            | SpeakError::ChannelError(msg) => msg.clone(),
            SpeakError::EngineUnavailable(engine) => format!("{} is not available", engine),
            SpeakError::NoEngineAvailable => "no engine available".to_string(),
            SpeakError::Cancelled => "cancelled".to_string(),
        }
    }

    /// Get a user-friendly description for the status area
    pub fn user_message(&self) -> String {
        match self {
            SpeakError::InvalidRequest(msg) => msg.clone(),
            SpeakError::EngineUnavailable(engine) => {
                format!("{} is not available. {}", engine.display_name(), engine.install_hint())
            }
            SpeakError::NoEngineAvailable => {
                "No TTS engines available. Please install dependencies.".to_string()
            }
            SpeakError::NetworkError(_) => {
                "Could not reach the online speech service. Check your connection or switch to the offline engine.".to_string()
            }
            SpeakError::QuotaError(_) => {
                "The online speech service refused the request. Wait a moment or switch to the offline engine.".to_string()
            }
            SpeakError::Timeout => {
                "The online speech service timed out. Please try again.".to_string()
            }
            SpeakError::ModelNotFound(_) => {
                "Piper voice model not found. Download the voice model to use Piper TTS.".to_string()
            }
            SpeakError::SynthesisError(_) => {
                "Speech synthesis failed. Please try again.".to_string()
            }
            SpeakError::PlaybackDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            SpeakError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
            SpeakError::IOError(_) => "File system error occurred.".to_string(),
            SpeakError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SpeakError::Cancelled => "Stopped".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpeakError>;
