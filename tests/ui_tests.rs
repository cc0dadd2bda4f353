//! UI automation tests using egui_kittest and AccessKit
//!
//! These tests render the main window over a scripted controller and drive
//! it through the accessibility tree.

mod common;

use common::*;
use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use std::sync::Arc;
use std::time::Duration;
use unispeak::config::AppConfig;
use unispeak::session::PlaybackState;
use unispeak::speech::{EngineChoice, EngineStatus};
use unispeak::ui::{SpeakApp, StatusLevel, UiState};
use unispeak::SpeakError;

struct Fixture {
    online: Arc<ScriptedBackend>,
    offline: Arc<ScriptedBackend>,
    sink: Arc<ScriptedSink>,
}

fn build_app(online: ScriptedBackend, offline: ScriptedBackend, sink: ScriptedSink) -> (SpeakApp, Fixture) {
    let online = Arc::new(online);
    let offline = Arc::new(offline);
    let sink = Arc::new(sink);
    let controller = controller(&[online.clone(), offline.clone()], &sink);
    let config = AppConfig::default();
    let state = UiState::new(controller, &config);
    let app = SpeakApp::with_state(state, config, None);
    (app, Fixture { online, offline, sink })
}

fn ready_app() -> (SpeakApp, Fixture) {
    build_app(
        ScriptedBackend::ready(EngineChoice::OnlineService),
        ScriptedBackend::ready(EngineChoice::OfflineService),
        ScriptedSink::new(),
    )
}

fn harness(app: SpeakApp) -> Harness<'static, SpeakApp> {
    Harness::builder()
        .with_size(egui::Vec2::new(900.0, 700.0))
        .build_state(|ctx, app: &mut SpeakApp| app.render(ctx), app)
}

/// Step frames until the UI has seen `expected`
fn step_until(harness: &mut Harness<'_, SpeakApp>, expected: &PlaybackState) -> bool {
    for _ in 0..300 {
        harness.step();
        if &harness.state().state().playback == expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_main_controls_exist() {
    let (app, _fixture) = ready_app();
    let mut harness = harness(app);
    harness.run();

    let _engine = harness.get_by_label("TTS engine");
    let _language = harness.get_by_label("Language");
    let _text = harness.get_by_label("Text to speak");
    let _speed = harness.get_by_label("Speech speed");
    let _play = harness.get_by_label("Play speech");
    let _speed_value = harness.get_by_label("1.0x");
    let _status = harness.get_by_label("Status: Ready - Google TTS");
}

#[test]
fn test_header_titles() {
    let (app, _fixture) = ready_app();
    let mut harness = harness(app);
    harness.run();

    let _title = harness.get_by_label("Text to Speech");
    let _subtitle = harness.get_by_label("Powered by Google TTS and Piper TTS");
}

#[test]
fn test_type_text_into_text_area() {
    let (app, _fixture) = ready_app();
    let mut harness = harness(app);
    harness.run();

    harness.get_by_label("Text to speak").focus();
    harness.run();
    harness.get_by_label("Text to speak").type_text("Hello world");
    harness.run();

    assert_eq!(harness.state().state().input_text, "Hello world");
}

#[test]
fn test_play_with_empty_text_warns() {
    let (app, fixture) = ready_app();
    let mut harness = harness(app);
    harness.run();

    harness.get_by_label("Play speech").click();
    harness.run();

    let status = &harness.state().state().status;
    assert_eq!(status.text, "Please enter some text to speak");
    assert_eq!(status.level, StatusLevel::Warning);
    assert_eq!(harness.state().state().controller.state(), PlaybackState::Idle);
    assert_eq!(fixture.online.calls(), 0);
    let _warning = harness.get_by_label("Status: Please enter some text to speak");
}

#[test]
fn test_play_then_stop() {
    let (app, fixture) = ready_app();
    let mut harness = harness(app);
    harness.state_mut().state_mut().input_text = "Hello world".to_string();
    harness.run();

    harness.get_by_label("Play speech").click();
    assert!(step_until(&mut harness, &PlaybackState::Playing));
    harness.step();

    assert!(fixture.sink.is_playing());
    assert_eq!(harness.state().state().status.text, "Playing...");
    harness.get_by_label("Stop speech").click();
    harness.step();

    assert_eq!(harness.state().state().controller.state(), PlaybackState::Stopped);
    assert!(!fixture.sink.is_playing());
    harness.step();
    let _play = harness.get_by_label("Play speech");
    assert_eq!(harness.state().state().status.text, "Stopped");
}

#[test]
fn test_playback_completion_returns_to_ready() {
    let (app, fixture) = ready_app();
    let mut harness = harness(app);
    harness.state_mut().state_mut().input_text = "Hello world".to_string();
    harness.run();

    harness.get_by_label("Play speech").click();
    assert!(step_until(&mut harness, &PlaybackState::Playing));

    fixture.sink.finish();
    assert!(step_until(&mut harness, &PlaybackState::Idle));
    assert_eq!(harness.state().state().status.text, "Ready - Google TTS");

    let log_messages: Vec<String> = harness
        .state()
        .state()
        .activity
        .entries()
        .map(|entry| entry.message.clone())
        .collect();
    assert!(log_messages.iter().any(|m| m.starts_with("Speaking 11 characters")));
    assert!(log_messages.iter().any(|m| m == "Playback finished"));
}

#[test]
fn test_online_failure_shows_error() {
    let (app, _fixture) = build_app(
        ScriptedBackend::ready(EngineChoice::OnlineService).failing(SpeakError::Timeout),
        ScriptedBackend::ready(EngineChoice::OfflineService),
        ScriptedSink::new(),
    );
    let mut harness = harness(app);
    harness.state_mut().state_mut().input_text = "Hello world".to_string();
    harness.run();

    harness.get_by_label("Play speech").click();
    assert!(step_until(&mut harness, &PlaybackState::Failed("timeout".to_string())));

    let status = &harness.state().state().status;
    assert_eq!(status.level, StatusLevel::Error);
    assert_eq!(status.text, SpeakError::Timeout.user_message());
}

#[test]
fn test_no_engines_disables_play() {
    let (app, fixture) = build_app(
        ScriptedBackend::ready(EngineChoice::OnlineService),
        ScriptedBackend::ready(EngineChoice::OfflineService),
        ScriptedSink::unavailable(),
    );
    let mut harness = harness(app);
    harness.state_mut().state_mut().input_text = "Hello world".to_string();
    harness.run();

    let _status = harness.get_by_label("Status: No TTS engines available. Please install dependencies.");
    harness.get_by_label("Play speech").click();
    harness.run();

    assert_eq!(fixture.online.calls() + fixture.offline.calls(), 0);
    assert_eq!(harness.state().state().controller.state(), PlaybackState::Idle);
}

#[test]
fn test_language_picker_only_for_online_engine() {
    let (app, _fixture) = ready_app();
    let mut harness = harness(app);
    harness.run();
    assert!(harness.query_by_label("Language").is_some());

    harness
        .state_mut()
        .state_mut()
        .select_engine(EngineChoice::OfflineService);
    harness.run();

    assert!(harness.query_by_label("Language").is_none());
    assert_eq!(harness.state().state().status.text, "Ready - Piper TTS");
}

#[test]
fn test_model_missing_warning() {
    let (app, _fixture) = build_app(
        ScriptedBackend::ready(EngineChoice::OnlineService),
        ScriptedBackend::ready(EngineChoice::OfflineService).with_status(EngineStatus::ModelMissing),
        ScriptedSink::new(),
    );
    let mut harness = harness(app);
    harness
        .state_mut()
        .state_mut()
        .select_engine(EngineChoice::OfflineService);
    harness.run();

    let status = &harness.state().state().status;
    assert_eq!(status.level, StatusLevel::Warning);
    assert!(status.text.contains("voice model not downloaded"));
}

#[test]
fn test_speed_label_follows_state() {
    let (app, _fixture) = ready_app();
    let mut harness = harness(app);
    harness.state_mut().state_mut().speed = 1.5;
    harness.run();

    let _label = harness.get_by_label("1.5x");
    assert!(harness.query_by_label("1.0x").is_none());
}

#[test]
fn test_speed_and_language_reach_request() {
    let (app, fixture) = ready_app();
    let mut harness = harness(app);
    {
        let state = harness.state_mut().state_mut();
        state.input_text = "Bonjour".to_string();
        state.language = "fr".to_string();
        state.speed = 0.7;
    }
    harness.run();

    harness.get_by_label("Play speech").click();
    assert!(step_until(&mut harness, &PlaybackState::Playing));

    let request = fixture.online.last_request().unwrap();
    assert_eq!(request.language.as_deref(), Some("fr"));
    assert!((request.speed - 0.7).abs() < f32::EPSILON);
}

#[test]
fn test_settings_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let online = Arc::new(ScriptedBackend::ready(EngineChoice::OnlineService));
    let offline = Arc::new(ScriptedBackend::ready(EngineChoice::OfflineService));
    let sink = Arc::new(ScriptedSink::new());
    let config = AppConfig::default();
    let mut state = UiState::new(controller(&[online, offline], &sink), &config);
    state.select_engine(EngineChoice::OfflineService);
    state.language = "de".to_string();
    state.speed = 1.3;

    let mut app = SpeakApp::with_state(state, config, Some(path.clone()));
    app.save_settings();

    let saved = AppConfig::load(&path).unwrap();
    assert_eq!(saved.engine, EngineChoice::OfflineService);
    assert_eq!(saved.language, "de");
    assert!((saved.speed - 1.3).abs() < f32::EPSILON);
}
