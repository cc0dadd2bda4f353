//! Online synthesis through Google Translate TTS
//!
//! The service accepts at most ~100 characters per request, so the text is
//! split into chunks and the MP3 answers are decoded and concatenated.
//! Its only speed control is a slow/normal switch.

use crate::speech::{
    CancelToken, EngineChoice, EngineStatus, SynthesisBackend, SynthesisRequest, SynthesizedAudio,
};
use crate::{Result, SpeakError};
use std::time::Duration;
use tracing::debug;

/// Public Translate TTS endpoint
pub const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Longest text the service accepts per request
pub const MAX_CHUNK_CHARS: usize = 100;

/// Network timeout per chunk request
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the Google engine
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub max_chunk_chars: usize,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_chunk_chars: MAX_CHUNK_CHARS,
        }
    }
}

impl GoogleConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Online engine backed by Google Translate TTS
pub struct GoogleBackend {
    config: GoogleConfig,
}

impl GoogleBackend {
    pub fn new(config: GoogleConfig) -> Self {
        Self { config }
    }

    /// Whether HTTP and MP3 support are part of this build
    pub fn is_installed() -> bool {
        cfg!(feature = "google")
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }
}

impl SynthesisBackend for GoogleBackend {
    fn engine(&self) -> EngineChoice {
        EngineChoice::OnlineService
    }

    fn probe(&self) -> EngineStatus {
        if Self::is_installed() {
            EngineStatus::Ready
        } else {
            EngineStatus::NotInstalled
        }
    }

    #[cfg(feature = "google")]
    fn synthesize(&self, request: &SynthesisRequest, cancel: &CancelToken) -> Result<SynthesizedAudio> {
        http::synthesize(&self.config, request, cancel)
    }

    #[cfg(not(feature = "google"))]
    fn synthesize(&self, request: &SynthesisRequest, _cancel: &CancelToken) -> Result<SynthesizedAudio> {
        debug!("Google TTS requested for {} chars but not compiled in", request.text.len());
        Err(SpeakError::EngineUnavailable(EngineChoice::OnlineService))
    }
}

/// Service speed parameter: below 1.0 selects the slow voice
pub fn service_speed(speed: f32) -> &'static str {
    if speed < 1.0 {
        "0.24"
    } else {
        "1"
    }
}

/// Split text into chunks of at most `max_chars` characters
///
/// Cuts after sentence punctuation where possible, then between words, and
/// only splits inside a word when the word alone is too long.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in sentence_pieces(text) {
        if char_len(&piece) > max_chars {
            push_chunk(&mut chunks, &mut current);
            for part in split_long_piece(&piece, max_chars) {
                append_or_push(&mut chunks, &mut current, &part, max_chars);
            }
        } else {
            append_or_push(&mut chunks, &mut current, &piece, max_chars);
        }
    }

    push_chunk(&mut chunks, &mut current);
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn sentence_pieces(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for c in text.chars() {
        piece.push(c);
        if matches!(c, '.' | '!' | '?' | ';' | ':' | '\n' | '。' | '！' | '？') {
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                pieces.push(trimmed.to_string());
            }
            piece.clear();
        }
    }

    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }

    pieces
}

fn split_long_piece(piece: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for word in piece.split_whitespace() {
        if char_len(word) > max_chars {
            push_chunk(&mut parts, &mut current);
            let chars: Vec<char> = word.chars().collect();
            for slice in chars.chunks(max_chars) {
                parts.push(slice.iter().collect());
            }
            continue;
        }
        append_or_push(&mut parts, &mut current, word, max_chars);
    }

    push_chunk(&mut parts, &mut current);
    parts
}

fn append_or_push(chunks: &mut Vec<String>, current: &mut String, piece: &str, max_chars: usize) {
    if current.is_empty() {
        current.push_str(piece);
    } else if char_len(current) + 1 + char_len(piece) <= max_chars {
        current.push(' ');
        current.push_str(piece);
    } else {
        push_chunk(chunks, current);
        current.push_str(piece);
    }
}

fn push_chunk(chunks: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}

#[cfg(feature = "google")]
mod http {
    use super::*;
    use reqwest::blocking::Client;
    use reqwest::StatusCode;
    use rodio::{Decoder, Source};
    use std::io::Cursor;
    use tracing::info;
    use url::Url;

    pub(super) fn synthesize(
        config: &GoogleConfig,
        request: &SynthesisRequest,
        cancel: &CancelToken,
    ) -> Result<SynthesizedAudio> {
        let chunks = split_text(&request.text, config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(SpeakError::InvalidRequest("Please enter some text to speak".to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("Unispeak/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(map_reqwest_error)?;

        let language = request.language_or_default();
        info!(
            "Google TTS: {} chunk(s), language '{}', slow={}",
            chunks.len(),
            language,
            request.speed < 1.0
        );

        let mut combined: Option<SynthesizedAudio> = None;
        for (idx, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!("Google TTS cancelled after {} of {} chunk(s)", idx, chunks.len());
                return Err(SpeakError::Cancelled);
            }
            let url = chunk_url(config, chunk, idx, chunks.len(), language, request.speed)?;
            let bytes = fetch(&client, url)?;
            let audio = decode_mp3(bytes)?;
            debug!("Chunk {} decoded: {:.2}s", idx, audio.duration_secs());

            match combined.as_mut() {
                None => combined = Some(audio),
                Some(all) => {
                    if all.sample_rate != audio.sample_rate || all.channels != audio.channels {
                        return Err(SpeakError::SynthesisError(
                            "service returned chunks in different audio formats".to_string(),
                        ));
                    }
                    all.samples.extend(audio.samples);
                }
            }
        }

        combined
            .filter(|audio| !audio.is_empty())
            .ok_or_else(|| SpeakError::SynthesisError("service returned no audio".to_string()))
    }

    pub(super) fn chunk_url(
        config: &GoogleConfig,
        chunk: &str,
        idx: usize,
        total: usize,
        language: &str,
        speed: f32,
    ) -> Result<Url> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        Url::parse_with_params(
            &config.endpoint,
            &[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", language),
                ("client", "tw-ob"),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("ttsspeed", service_speed(speed)),
            ],
        )
        .map_err(|e| SpeakError::ConfigError(format!("invalid endpoint '{}': {}", config.endpoint, e)))
    }

    fn fetch(client: &Client, url: Url) -> Result<Vec<u8>> {
        let response = client.get(url).send().map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(SpeakError::QuotaError(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(SpeakError::NetworkError(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().map_err(map_reqwest_error)?;
        Ok(bytes.to_vec())
    }

    fn map_reqwest_error(e: reqwest::Error) -> SpeakError {
        if e.is_timeout() {
            SpeakError::Timeout
        } else {
            SpeakError::NetworkError(e.to_string())
        }
    }

    pub(super) fn decode_mp3(bytes: Vec<u8>) -> Result<SynthesizedAudio> {
        let decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|e| SpeakError::SynthesisError(format!("could not decode audio: {}", e)))?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.map(|s| s as f32 / 32768.0).collect();

        Ok(SynthesizedAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}
