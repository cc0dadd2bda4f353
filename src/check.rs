//! `--check`: report which engines and audio output this build can use

use crate::audio::{probe_output_device, OutputDeviceInfo};
use crate::config::AppConfig;
use crate::speech::{EngineChoice, EngineStatus, GoogleBackend, PiperBackend, SynthesisBackend};
use std::fmt;
use std::path::PathBuf;

/// Probe results for one engine
#[derive(Clone, Debug, PartialEq)]
pub struct EngineReport {
    pub engine: EngineChoice,
    pub status: EngineStatus,
    /// Voice files that still need downloading
    pub missing_files: Vec<PathBuf>,
}

/// Everything `--check` prints
#[derive(Clone, Debug, PartialEq)]
pub struct CheckReport {
    pub engines: Vec<EngineReport>,
    pub audio_device: Option<OutputDeviceInfo>,
}

impl CheckReport {
    /// Probe the engines described by `config` and the default output device
    ///
    /// Makes no network calls and does not load the voice model.
    pub fn gather(config: &AppConfig) -> Self {
        let google = GoogleBackend::new(config.google_config());
        let piper = PiperBackend::new(config.piper_config());

        let engines = vec![
            EngineReport {
                engine: google.engine(),
                status: google.probe(),
                missing_files: Vec::new(),
            },
            EngineReport {
                engine: piper.engine(),
                status: piper.probe(),
                missing_files: piper.voice().missing_files(),
            },
        ];

        Self {
            engines,
            audio_device: probe_output_device(),
        }
    }

    /// Engines `play` would accept with this setup
    pub fn available_engines(&self) -> Vec<EngineChoice> {
        if self.audio_device.is_none() {
            return Vec::new();
        }
        self.engines
            .iter()
            .filter(|report| report.status.is_available())
            .map(|report| report.engine)
            .collect()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Text-to-Speech Application {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(f, "{}", "=".repeat(40))?;
        writeln!(f, "Checking dependencies...")?;
        writeln!(f)?;

        for report in &self.engines {
            let mark = if report.status.is_available() { "✓" } else { "✗" };
            writeln!(
                f,
                "{} {} - {}",
                mark,
                report.engine.display_name(),
                report.status.label(report.engine)
            )?;
            for missing in &report.missing_files {
                writeln!(f, "    missing: {}", missing.display())?;
            }
        }

        match &self.audio_device {
            Some(device) => {
                write!(f, "✓ Audio output - {}", device.name)?;
                if let (Some(rate), Some(channels)) = (device.sample_rate, device.channels) {
                    write!(f, " ({} Hz, {} ch)", rate, channels)?;
                }
                writeln!(f)?;
            }
            None => writeln!(f, "✗ Audio output - no device found")?,
        }
        writeln!(f)?;

        let not_installed: Vec<&EngineReport> = self
            .engines
            .iter()
            .filter(|report| report.status == EngineStatus::NotInstalled)
            .collect();
        if !not_installed.is_empty() {
            writeln!(f, "To enable missing engines:")?;
            writeln!(f, "{}", "-".repeat(40))?;
            for report in not_installed {
                writeln!(f, "{}: {}", report.engine.display_name(), report.engine.install_hint())?;
            }
            writeln!(f)?;
        }

        if self
            .engines
            .iter()
            .any(|report| report.status == EngineStatus::ModelMissing)
        {
            writeln!(
                f,
                "Download a Piper voice (.onnx, .onnx.json and tokens.txt) into the voice directory."
            )?;
            writeln!(f)?;
        }

        if self.audio_device.is_none() {
            writeln!(f, "WARNING: an audio output device is required for playback!")?;
        }

        let available = self.available_engines();
        if available.is_empty() {
            writeln!(f, "No TTS engines available.")
        } else {
            let names: Vec<&str> = available.iter().map(|e| e.display_name()).collect();
            writeln!(f, "Available engines: {}", names.join(", "))
        }
    }
}
