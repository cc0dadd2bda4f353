//! Settings file
//!
//! Stored as TOML under the platform config directory. A missing file gives
//! the defaults; CLI flags are applied on top after loading.

use crate::speech::offline::PiperConfig;
use crate::speech::online::{GoogleConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, MAX_CHUNK_CHARS};
use crate::speech::voice::{default_voice_dir, VoiceModel, DEFAULT_VOICE_NAME};
use crate::speech::{language_by_code, EngineChoice, DEFAULT_LANGUAGE, MAX_SPEED, MIN_SPEED};
use crate::{Result, SpeakError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest chunk the online service accepts
pub const CHUNK_CHARS_LIMIT: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine selected at startup
    pub engine: EngineChoice,

    /// Language code for the online engine
    pub language: String,

    pub speed: f32,

    pub online: OnlineSettings,

    pub offline: OfflineSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_chunk_chars: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineSettings {
    /// Directory holding Piper voices
    pub voice_dir: PathBuf,
    pub voice_name: String,
    pub speaker_id: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineChoice::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            speed: 1.0,
            online: OnlineSettings::default(),
            offline: OfflineSettings::default(),
        }
    }
}

impl Default for OnlineSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_chunk_chars: MAX_CHUNK_CHARS,
        }
    }
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            voice_dir: default_voice_dir(),
            voice_name: DEFAULT_VOICE_NAME.to_string(),
            speaker_id: 0,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/unispeak/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("unispeak").join("config.toml"))
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            SpeakError::ConfigError(format!("{}: {}", path.display(), e))
        })?;

        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Settings for startup, plus the path they are saved back to
    ///
    /// A broken file given explicitly is an error unless `lenient` is set;
    /// the default location always falls back to defaults.
    pub fn resolve(explicit: Option<&Path>, lenient: bool) -> Result<(Self, Option<PathBuf>)> {
        let path = explicit.map(Path::to_path_buf).or_else(Self::default_path);
        let config = match &path {
            Some(path) if explicit.is_some() && !lenient => Self::load(path)?,
            Some(path) => Self::load_or_default(path),
            None => Self::default(),
        };
        Ok((config, path))
    }

    /// Like `load`, but a broken file is logged and replaced by defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring config: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SpeakError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(SpeakError::ConfigError(format!(
                "speed must be between {} and {}, got {}",
                MIN_SPEED, MAX_SPEED, self.speed
            )));
        }
        if self.online.timeout_secs == 0 {
            return Err(SpeakError::ConfigError(
                "online.timeout_secs must be positive".to_string(),
            ));
        }
        if !(1..=CHUNK_CHARS_LIMIT).contains(&self.online.max_chunk_chars) {
            return Err(SpeakError::ConfigError(format!(
                "online.max_chunk_chars must be between 1 and {}",
                CHUNK_CHARS_LIMIT
            )));
        }
        if language_by_code(&self.language).is_none() {
            return Err(SpeakError::ConfigError(format!(
                "unsupported language: {}",
                self.language
            )));
        }
        Ok(())
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        engine: Option<EngineChoice>,
        voice_dir: Option<PathBuf>,
        voice_name: Option<String>,
    ) -> Self {
        if let Some(engine) = engine {
            self.engine = engine;
        }
        if let Some(dir) = voice_dir {
            self.offline.voice_dir = dir;
        }
        if let Some(name) = voice_name {
            self.offline.voice_name = name;
        }
        self
    }

    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig {
            endpoint: self.online.endpoint.clone(),
            timeout: Duration::from_secs(self.online.timeout_secs),
            max_chunk_chars: self.online.max_chunk_chars,
        }
    }

    pub fn piper_config(&self) -> PiperConfig {
        PiperConfig::new(self.voice_model()).with_speaker(self.offline.speaker_id)
    }

    pub fn voice_model(&self) -> VoiceModel {
        VoiceModel::new(&self.offline.voice_dir, &self.offline.voice_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.engine, EngineChoice::OnlineService);
        assert_eq!(config.language, "en");
        assert_eq!(config.online.timeout_secs, 10);
        assert_eq!(config.offline.voice_name, "en_US-norman-medium");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
engine = "offline_service"
speed = 1.5

[offline]
voice_name = "de_DE-thorsten-low"
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.engine, EngineChoice::OfflineService);
        assert!((config.speed - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.offline.voice_name, "de_DE-thorsten-low");
        assert_eq!(config.online.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.engine = EngineChoice::OfflineService;
        config.language = "ja".to_string();
        config.speed = 0.7;
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.speed = 3.0;
        assert!(matches!(config.validate(), Err(SpeakError::ConfigError(_))));

        let mut config = AppConfig::default();
        config.online.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.online.max_chunk_chars = 500;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.language = "xx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "speed = \"fast\"").unwrap();

        assert!(AppConfig::load(&path).is_err());
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn test_resolve_explicit_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "speed = \"fast\"").unwrap();

        assert!(matches!(
            AppConfig::resolve(Some(&path), false),
            Err(SpeakError::ConfigError(_))
        ));

        let (config, saved_to) = AppConfig::resolve(Some(&path), true).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(saved_to, Some(path));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(EngineChoice::OfflineService),
            Some(PathBuf::from("/opt/voices")),
            Some("en_GB-alan-low".to_string()),
        );
        assert_eq!(config.engine, EngineChoice::OfflineService);
        assert_eq!(
            config.voice_model().model_path(),
            PathBuf::from("/opt/voices/en_GB-alan-low.onnx")
        );
        assert_eq!(config.google_config().timeout, Duration::from_secs(10));
    }
}
