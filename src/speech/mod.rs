//! Speech synthesis backends
//!
//! This module provides:
//! - The `SynthesisBackend` capability trait shared by both engines
//! - Online synthesis through Google Translate TTS
//! - Offline synthesis with Piper voices (VITS models via sherpa-rs)

pub mod offline;
pub mod online;
pub mod voice;

use crate::{Result, SpeakError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use offline::PiperBackend;
pub use online::GoogleBackend;
pub use voice::{VoiceMetadata, VoiceModel};

/// Slowest speed accepted by a request
pub const MIN_SPEED: f32 = 0.5;

/// Fastest speed accepted by a request
pub const MAX_SPEED: f32 = 2.0;

/// Which synthesis engine serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineChoice {
    /// Google Translate TTS, needs network access
    #[default]
    OnlineService,
    /// Piper voice running locally, needs a downloaded voice model
    OfflineService,
}

impl EngineChoice {
    /// Both engines, in the order the engine picker lists them
    pub const ALL: [EngineChoice; 2] = [EngineChoice::OnlineService, EngineChoice::OfflineService];

    pub fn display_name(&self) -> &'static str {
        match self {
            EngineChoice::OnlineService => "Google TTS",
            EngineChoice::OfflineService => "Piper TTS",
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            EngineChoice::OnlineService => "Rebuild with the `google` feature enabled.",
            EngineChoice::OfflineService => "Rebuild with the `piper` feature enabled.",
        }
    }

    /// Whether the language setting is used by this engine
    pub fn uses_language(&self) -> bool {
        matches!(self, EngineChoice::OnlineService)
    }
}

impl fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineChoice::OnlineService => write!(f, "online"),
            EngineChoice::OfflineService => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for EngineChoice {
    type Err = SpeakError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" | "google" => Ok(EngineChoice::OnlineService),
            "offline" | "piper" => Ok(EngineChoice::OfflineService),
            other => Err(SpeakError::ConfigError(format!("unknown engine '{}'", other))),
        }
    }
}

/// Result of probing an engine without touching the network or the voice model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Engine is compiled in and ready
    Ready,
    /// Engine is compiled in but its voice model is not on disk yet
    ModelMissing,
    /// Engine support is not part of this build
    NotInstalled,
}

impl EngineStatus {
    /// Whether the engine can be selected
    ///
    /// A missing voice model is only detected at synthesis time, so it does
    /// not make the engine unavailable.
    pub fn is_available(&self) -> bool {
        !matches!(self, EngineStatus::NotInstalled)
    }

    /// Label shown next to the engine name in the picker and `--check`
    pub fn label(&self, engine: EngineChoice) -> &'static str {
        match (engine, self) {
            (EngineChoice::OnlineService, EngineStatus::Ready) => "Online",
            (EngineChoice::OfflineService, EngineStatus::Ready) => "Offline",
            (_, EngineStatus::ModelMissing) => "Model Not Downloaded",
            (_, EngineStatus::NotInstalled) => "Not Installed",
        }
    }
}

/// A language offered by the online engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

/// Languages offered in the language picker
pub static LANGUAGES: [Language; 10] = [
    Language { name: "English", code: "en" },
    Language { name: "Spanish", code: "es" },
    Language { name: "French", code: "fr" },
    Language { name: "German", code: "de" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
    Language { name: "Russian", code: "ru" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Korean", code: "ko" },
    Language { name: "Chinese", code: "zh" },
];

/// Default language code for the online engine
pub const DEFAULT_LANGUAGE: &str = "en";

/// Look up a language by its code
pub fn language_by_code(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// A single request to speak some text
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub engine: EngineChoice,
    pub speed: f32,
    /// Only meaningful for the online engine
    pub language: Option<String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, engine: EngineChoice) -> Self {
        Self {
            text: text.into(),
            engine,
            speed: 1.0,
            language: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Language to send to the online engine
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Check text and speed before any backend is involved
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(SpeakError::InvalidRequest(
                "Please enter some text to speak".to_string(),
            ));
        }

        if !self.speed.is_finite() || self.speed < MIN_SPEED || self.speed > MAX_SPEED {
            return Err(SpeakError::InvalidRequest(format!(
                "Speed must be between {:.1}x and {:.1}x (got {})",
                MIN_SPEED, MAX_SPEED, self.speed
            )));
        }

        Ok(())
    }
}

/// Audio produced by a backend
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedAudio {
    /// Interleaved f32 samples
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SynthesizedAudio {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Get the duration of this audio in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Shared flag telling a running synthesis that its job was stopped or replaced
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the job has been cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SpeakError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Capability shared by the online and offline engines
///
/// `synthesize` blocks; the session controller calls it from a worker thread.
pub trait SynthesisBackend: Send + Sync {
    /// Which engine this backend implements
    fn engine(&self) -> EngineChoice;

    /// Display name
    fn name(&self) -> &str {
        self.engine().display_name()
    }

    /// Probe presence without network calls or loading the voice model
    fn probe(&self) -> EngineStatus;

    /// Turn the request text into audio
    ///
    /// Backends poll `cancel` between units of work and return
    /// `SpeakError::Cancelled` once it is set.
    fn synthesize(&self, request: &SynthesisRequest, cancel: &CancelToken) -> Result<SynthesizedAudio>;
}
