//! Offline synthesis with Piper voices through sherpa-rs (VITS models)
//!
//! The model is loaded on the first request and kept for the rest of the
//! session. Speed is handed to the model directly, which is the same as
//! running the voice with a length scale of `1 / speed`.

use crate::speech::voice::VoiceModel;
use crate::speech::{
    CancelToken, EngineChoice, EngineStatus, SynthesisBackend, SynthesisRequest, SynthesizedAudio,
};
use crate::Result;
#[cfg(feature = "piper")]
use crate::SpeakError;
#[cfg(feature = "piper")]
use parking_lot::Mutex;
#[cfg(feature = "piper")]
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use tracing::debug;
#[cfg(feature = "piper")]
use tracing::info;

/// Configuration for the Piper engine
#[derive(Clone, Debug)]
pub struct PiperConfig {
    /// Voice model files
    pub voice: VoiceModel,

    /// Speaker ID for multi-speaker voices
    pub speaker_id: i32,

    /// Override for the voice's noise scale
    pub noise_scale: Option<f32>,

    /// Override for the voice's noise width
    pub noise_scale_w: Option<f32>,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            voice: VoiceModel::default(),
            speaker_id: 0,
            noise_scale: None,
            noise_scale_w: None,
        }
    }
}

impl PiperConfig {
    pub fn new(voice: VoiceModel) -> Self {
        Self {
            voice,
            ..Default::default()
        }
    }

    /// Set the speaker ID for multi-speaker voices
    pub fn with_speaker(mut self, speaker_id: i32) -> Self {
        self.speaker_id = speaker_id;
        self
    }
}

/// Loaded sherpa-rs engine
#[cfg(feature = "piper")]
struct LoadedVoice {
    tts: VitsTts,
}

#[cfg(feature = "piper")]
impl LoadedVoice {
    fn load(config: &PiperConfig) -> Result<Self> {
        config.voice.ensure_present()?;
        let metadata = config.voice.metadata()?;

        let model_path = config.voice.model_path();
        info!("Loading Piper voice from: {}", model_path.display());

        let espeak_dir = config.voice.espeak_data_dir();
        let data_dir = if espeak_dir.is_dir() {
            espeak_dir.display().to_string()
        } else {
            String::new()
        };

        let vits_config = VitsTtsConfig {
            model: model_path.display().to_string(),
            tokens: config.voice.tokens_path().display().to_string(),
            data_dir,
            length_scale: 1.0,
            noise_scale: config.noise_scale.unwrap_or(metadata.inference.noise_scale),
            noise_scale_w: config.noise_scale_w.unwrap_or(metadata.inference.noise_w),
            ..Default::default()
        };

        let tts = VitsTts::new(vits_config);

        info!(
            "Piper voice '{}' ready ({} Hz)",
            config.voice.name, metadata.audio.sample_rate
        );

        Ok(Self { tts })
    }

    fn synthesize(&mut self, text: &str, speaker_id: i32, speed: f32) -> Result<SynthesizedAudio> {
        let audio = self
            .tts
            .create(text, speaker_id, speed)
            .map_err(|e| SpeakError::SynthesisError(format!("Synthesis failed: {}", e)))?;

        if audio.samples.is_empty() {
            return Err(SpeakError::SynthesisError("voice produced no audio".to_string()));
        }

        Ok(SynthesizedAudio::mono(audio.samples, audio.sample_rate as u32))
    }
}

/// Offline engine backed by a Piper voice
pub struct PiperBackend {
    config: PiperConfig,
    #[cfg(feature = "piper")]
    loaded: Mutex<Option<LoadedVoice>>,
}

impl PiperBackend {
    pub fn new(config: PiperConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "piper")]
            loaded: Mutex::new(None),
        }
    }

    pub fn voice(&self) -> &VoiceModel {
        &self.config.voice
    }

    /// Whether sherpa-rs support is part of this build
    pub fn is_installed() -> bool {
        cfg!(feature = "piper")
    }
}

impl SynthesisBackend for PiperBackend {
    fn engine(&self) -> EngineChoice {
        EngineChoice::OfflineService
    }

    fn probe(&self) -> EngineStatus {
        if !Self::is_installed() {
            return EngineStatus::NotInstalled;
        }
        if self.config.voice.is_present() {
            EngineStatus::Ready
        } else {
            EngineStatus::ModelMissing
        }
    }

    #[cfg(feature = "piper")]
    fn synthesize(&self, request: &SynthesisRequest, cancel: &CancelToken) -> Result<SynthesizedAudio> {
        cancel.check()?;
        let mut loaded = self.loaded.lock();
        // A replaced job may have waited here for the previous one
        cancel.check()?;
        if loaded.is_none() {
            *loaded = Some(LoadedVoice::load(&self.config)?);
        }

        debug!(
            "Piper synthesizing {} chars at {:.1}x",
            request.text.chars().count(),
            request.speed
        );

        match loaded.as_mut() {
            Some(voice) => voice.synthesize(&piper_text(&request.text), self.config.speaker_id, request.speed),
            None => Err(SpeakError::SynthesisError("voice failed to load".to_string())),
        }
    }

    #[cfg(not(feature = "piper"))]
    fn synthesize(&self, request: &SynthesisRequest, _cancel: &CancelToken) -> Result<SynthesizedAudio> {
        debug!("Piper requested for {} chars but not compiled in", request.text.len());
        Err(crate::SpeakError::EngineUnavailable(EngineChoice::OfflineService))
    }
}

/// Text as handed to the model; sherpa-onnx takes a C string
#[cfg_attr(not(feature = "piper"), allow(dead_code))]
fn piper_text(text: &str) -> String {
    text.replace('\0', "").trim().to_string()
}
