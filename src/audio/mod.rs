//! Audio playback
//!
//! Synthesized audio is handed to an `AudioSink`. The real sink plays it
//! through rodio on a dedicated player thread; the device is opened per
//! playback and released when playback stops or finishes.

#[cfg(feature = "audio-io")]
pub mod output;

#[cfg(feature = "audio-io")]
pub use output::RodioOutput;

use crate::speech::SynthesizedAudio;
use crate::{Result, SpeakError};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use tracing::warn;

/// How a playback ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// All samples were played
    Finished,
    /// Playback was interrupted by `stop` or a newer playback
    Stopped,
    /// The device failed mid-playback
    Failed(String),
}

/// Audio playback collaborator
pub trait AudioSink: Send + Sync {
    /// Whether an output device can be used
    fn is_available(&self) -> bool;

    /// Start playing; returns once the device is open
    ///
    /// The receiver yields exactly one outcome when playback ends.
    fn start(&self, audio: SynthesizedAudio) -> Result<Receiver<PlaybackOutcome>>;

    /// Stop playing and release the device before returning
    fn stop(&self);
}

/// Default output device as reported by the audio host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDeviceInfo {
    pub name: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// Look up the default output device without opening a stream
#[cfg(feature = "audio-io")]
pub fn probe_output_device() -> Option<OutputDeviceInfo> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    let device = host.default_output_device()?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    let config = device.default_output_config().ok();

    Some(OutputDeviceInfo {
        name,
        sample_rate: config.as_ref().map(|c| c.sample_rate().0),
        channels: config.as_ref().map(|c| c.channels()),
    })
}

#[cfg(not(feature = "audio-io"))]
pub fn probe_output_device() -> Option<OutputDeviceInfo> {
    None
}

/// Sink used when no audio backend is compiled in or the player failed to start
pub struct NullOutput;

impl AudioSink for NullOutput {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _audio: SynthesizedAudio) -> Result<Receiver<PlaybackOutcome>> {
        Err(SpeakError::PlaybackDeviceError("no audio output available".to_string()))
    }

    fn stop(&self) {}
}

/// Create the sink for this build
pub fn default_sink() -> Arc<dyn AudioSink> {
    #[cfg(feature = "audio-io")]
    {
        match RodioOutput::new() {
            Ok(output) => return Arc::new(output),
            Err(e) => warn!("Audio player unavailable: {}", e),
        }
    }
    #[cfg(not(feature = "audio-io"))]
    warn!("Built without audio output support");

    Arc::new(NullOutput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_output_refuses_playback() {
        let sink = NullOutput;
        assert!(!sink.is_available());
        let err = sink.start(SynthesizedAudio::mono(vec![0.0; 10], 22050)).unwrap_err();
        assert!(matches!(err, SpeakError::PlaybackDeviceError(_)));
        sink.stop();
    }

    #[test]
    fn test_probe_does_not_panic() {
        // Headless CI has no device; only the shape of the answer is checked
        if let Some(info) = probe_output_device() {
            assert!(!info.name.is_empty());
        }
    }
}
