//! Piper voice model files
//!
//! A voice is a weights/metadata pair (`<name>.onnx` + `<name>.onnx.json`).
//! sherpa-onnx additionally needs the voice's `tokens.txt` and the
//! `espeak-ng-data` directory, both shipped next to the model.

use crate::{Result, SpeakError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Voice used when nothing else is configured
pub const DEFAULT_VOICE_NAME: &str = "en_US-norman-medium";

/// Native sample rate of medium-quality Piper voices
pub const DEFAULT_VOICE_SAMPLE_RATE: u32 = 22050;

/// Default directory holding Piper voices (`~/.local/share/piper` on Linux)
pub fn default_voice_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("piper")
}

/// Location of a Piper voice on disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceModel {
    pub dir: PathBuf,
    pub name: String,
}

impl Default for VoiceModel {
    fn default() -> Self {
        Self::new(default_voice_dir(), DEFAULT_VOICE_NAME)
    }
}

impl VoiceModel {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// ONNX weights
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(format!("{}.onnx", self.name))
    }

    /// Piper metadata next to the weights
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(format!("{}.onnx.json", self.name))
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.dir.join("tokens.txt")
    }

    pub fn espeak_data_dir(&self) -> PathBuf {
        self.dir.join("espeak-ng-data")
    }

    /// Whether the files needed for synthesis are on disk
    pub fn is_present(&self) -> bool {
        self.missing_files().is_empty()
    }

    /// Files required for synthesis that are not on disk
    pub fn missing_files(&self) -> Vec<PathBuf> {
        [self.model_path(), self.tokens_path()]
            .into_iter()
            .filter(|p| !p.is_file())
            .collect()
    }

    /// Fail with `ModelNotFound` naming the first missing file
    pub fn ensure_present(&self) -> Result<()> {
        match self.missing_files().into_iter().next() {
            Some(missing) => Err(SpeakError::ModelNotFound(missing.display().to_string())),
            None => Ok(()),
        }
    }

    /// Read the `.onnx.json` metadata, falling back to defaults when absent
    pub fn metadata(&self) -> Result<VoiceMetadata> {
        let path = self.config_path();
        if !path.is_file() {
            debug!("No voice metadata at {}, using defaults", path.display());
            return Ok(VoiceMetadata::default());
        }
        VoiceMetadata::from_file(&path)
    }
}

/// Subset of a Piper `.onnx.json` file used for synthesis
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct VoiceMetadata {
    #[serde(default)]
    pub audio: AudioSection,
    #[serde(default)]
    pub language: Option<LanguageSection>,
    #[serde(default)]
    pub inference: InferenceSection,
    #[serde(default = "default_num_speakers")]
    pub num_speakers: u32,
}

impl Default for VoiceMetadata {
    fn default() -> Self {
        Self {
            audio: AudioSection::default(),
            language: None,
            inference: InferenceSection::default(),
            num_speakers: default_num_speakers(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AudioSection {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub quality: Option<String>,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_VOICE_SAMPLE_RATE,
            quality: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LanguageSection {
    pub code: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InferenceSection {
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,
    #[serde(default = "default_length_scale")]
    pub length_scale: f32,
    #[serde(default = "default_noise_w")]
    pub noise_w: f32,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            noise_scale: default_noise_scale(),
            length_scale: default_length_scale(),
            noise_w: default_noise_w(),
        }
    }
}

fn default_num_speakers() -> u32 {
    1
}

fn default_sample_rate() -> u32 {
    DEFAULT_VOICE_SAMPLE_RATE
}

fn default_noise_scale() -> f32 {
    0.667
}

fn default_length_scale() -> f32 {
    1.0
}

fn default_noise_w() -> f32 {
    0.8
}

impl VoiceMetadata {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| SpeakError::ModelNotFound(format!("invalid voice metadata: {}", e)))
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language.as_ref().map(|l| l.code.as_str())
    }
}
