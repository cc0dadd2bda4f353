//! Form state for the GUI
//!
//! Holds what the user typed and picked, mirrors the controller's playback
//! state, and turns session events into the status line and activity log.

use crate::config::AppConfig;
use crate::session::{PlaybackController, PlaybackState, SessionEvent};
use crate::speech::{language_by_code, EngineChoice, EngineStatus, SynthesisRequest, DEFAULT_LANGUAGE};
use crate::SpeakError;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use tracing::debug;

/// Entries kept in the activity log
pub const ACTIVITY_LOG_CAPACITY: usize = 100;

/// Colour class of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Ready,
    Busy,
    Playing,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusLine {
    fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: DateTime<Local>,
    pub message: String,
}

/// Bounded, timestamped log shown in the collapsible panel
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(ACTIVITY_LOG_CAPACITY),
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        if self.entries.len() >= ACTIVITY_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            time: Local::now(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

/// State behind the main window
pub struct UiState {
    pub controller: PlaybackController,
    pub input_text: String,
    /// Language code for the online engine
    pub language: String,
    pub speed: f32,
    /// Last playback state reported by the controller
    pub playback: PlaybackState,
    pub status: StatusLine,
    pub activity: ActivityLog,
}

impl UiState {
    pub fn new(controller: PlaybackController, config: &AppConfig) -> Self {
        let language = if language_by_code(&config.language).is_some() {
            config.language.clone()
        } else {
            DEFAULT_LANGUAGE.to_string()
        };

        let mut state = Self {
            controller,
            input_text: String::new(),
            language,
            speed: config.speed,
            playback: PlaybackState::Idle,
            status: StatusLine::new("Ready", StatusLevel::Ready),
            activity: ActivityLog::new(),
        };

        state.activity.add("Application started");
        match state.selected_engine() {
            Some(engine) => {
                state.activity.add(format!("Using {}", engine.display_name()));
                state.status = state.ready_status(engine);
            }
            None => state.report_error(&SpeakError::NoEngineAvailable),
        }
        state
    }

    pub fn selected_engine(&self) -> Option<EngineChoice> {
        self.controller.selected_engine()
    }

    pub fn engine_status(&self, engine: EngineChoice) -> EngineStatus {
        self.controller.engine_status(engine)
    }

    pub fn is_engine_available(&self, engine: EngineChoice) -> bool {
        self.controller.available_engines().contains(&engine)
    }

    /// Asks the controller directly so the button never lags behind a click
    pub fn is_busy(&self) -> bool {
        self.controller.state().is_busy()
    }

    pub fn select_engine(&mut self, engine: EngineChoice) {
        if self.selected_engine() == Some(engine) {
            return;
        }
        match self.controller.select_engine(engine) {
            Ok(()) => {
                self.activity.add(format!("Switched to {}", engine.display_name()));
                if !self.is_busy() {
                    self.status = self.ready_status(engine);
                }
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// PLAY/STOP button
    pub fn toggle_playback(&mut self) {
        if self.is_busy() {
            self.stop();
        } else {
            self.play();
        }
    }

    pub fn play(&mut self) {
        if self.input_text.trim().is_empty() {
            self.status = StatusLine::new("Please enter some text to speak", StatusLevel::Warning);
            return;
        }

        let Some(engine) = self.selected_engine() else {
            self.report_error(&SpeakError::NoEngineAvailable);
            return;
        };

        let mut request = SynthesisRequest::new(self.input_text.clone(), engine).with_speed(self.speed);
        if engine.uses_language() {
            request = request.with_language(self.language.clone());
        }

        match self.controller.play(request) {
            Ok(job) => {
                debug!("Requested job {}", job);
                self.activity.add(format!(
                    "Speaking {} characters with {} at {:.1}x",
                    self.input_text.trim().chars().count(),
                    engine.display_name(),
                    self.speed
                ));
            }
            Err(e) => self.report_error(&e),
        }
    }

    pub fn stop(&mut self) {
        self.controller.stop();
        self.activity.add("Playback stopped");
    }

    /// Drain controller events into the form
    pub fn poll_events(&mut self) {
        while let Some(event) = self.controller.try_recv_event() {
            match event {
                SessionEvent::StateChanged(state) => self.apply_state(state),
                SessionEvent::Error(e) => self.report_error(&e),
            }
        }
    }

    fn apply_state(&mut self, state: PlaybackState) {
        let engine_name = self
            .selected_engine()
            .map(|e| e.display_name())
            .unwrap_or("TTS");

        match &state {
            PlaybackState::Synthesizing => {
                self.status = StatusLine::new(
                    format!("Generating speech with {}...", engine_name),
                    StatusLevel::Busy,
                );
            }
            PlaybackState::Playing => {
                self.status = StatusLine::new("Playing...", StatusLevel::Playing);
            }
            PlaybackState::Idle => {
                self.activity.add("Playback finished");
                if let Some(engine) = self.selected_engine() {
                    self.status = self.ready_status(engine);
                }
            }
            PlaybackState::Stopped => {
                self.status = StatusLine::new("Stopped", StatusLevel::Ready);
            }
            // The matching Error event carries the message
            PlaybackState::Failed(_) => {}
        }
        self.playback = state;
    }

    fn report_error(&mut self, err: &SpeakError) {
        self.activity.add(format!("Error: {}", err));
        self.status = StatusLine::new(err.user_message(), StatusLevel::Error);
    }

    fn ready_status(&self, engine: EngineChoice) -> StatusLine {
        match self.engine_status(engine) {
            EngineStatus::ModelMissing => StatusLine::new(
                format!("{} selected - voice model not downloaded", engine.display_name()),
                StatusLevel::Warning,
            ),
            _ => StatusLine::new(format!("Ready - {}", engine.display_name()), StatusLevel::Ready),
        }
    }

    /// Settings to write back on exit
    pub fn to_config(&self, base: &AppConfig) -> AppConfig {
        let mut config = base.clone();
        if let Some(engine) = self.selected_engine() {
            config.engine = engine;
        }
        config.language = self.language.clone();
        config.speed = self.speed;
        config
    }
}
