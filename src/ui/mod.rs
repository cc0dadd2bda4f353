//! GUI implementation with egui/eframe

mod app;
pub mod components;
mod state;
mod theme;

pub use app::SpeakApp;
pub use state::{ActivityLog, LogEntry, StatusLevel, StatusLine, UiState, ACTIVITY_LOG_CAPACITY};
pub use theme::Theme;

use crate::config::AppConfig;
use crate::session::PlaybackController;
use std::path::PathBuf;

/// Run the Text to Speech window
pub fn run(config: AppConfig, config_path: Option<PathBuf>) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Text to Speech"),
        ..Default::default()
    };

    eframe::run_native(
        "Text to Speech",
        options,
        Box::new(move |cc| {
            let controller = PlaybackController::from_config(&config);
            let state = UiState::new(controller, &config);
            Ok(Box::new(SpeakApp::new(cc, state, config, config_path)))
        }),
    )
}
