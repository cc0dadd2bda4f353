//! Main window and eframe integration

use crate::config::AppConfig;
use crate::ui::components::{ActivityPanel, EnginePicker, PlaybackControls, StatusBar, TextInput};
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Repaint interval while a job is in flight, so events are picked up
const BUSY_REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct SpeakApp {
    state: UiState,
    theme: Theme,
    config: AppConfig,
    /// Where settings are written back on exit
    config_path: Option<PathBuf>,
}

impl SpeakApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        state: UiState,
        config: AppConfig,
        config_path: Option<PathBuf>,
    ) -> Self {
        let app = Self::with_state(state, config, config_path);
        app.theme.apply(&cc.egui_ctx);
        app
    }

    /// Build without an eframe context (used by UI tests)
    pub fn with_state(state: UiState, config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            state,
            theme: Theme::light(),
            config,
            config_path,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UiState {
        &mut self.state
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("Text to Speech")
                            .size(24.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.label(
                        RichText::new("Powered by Google TTS and Piper TTS")
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                });
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                EnginePicker::new(&mut self.state, &self.theme).show(ui);
                ui.add_space(self.theme.spacing_sm);

                TextInput::new(&mut self.state, &self.theme).show(ui);
                ui.add_space(self.theme.spacing_sm);

                PlaybackControls::new(&mut self.state, &self.theme).show(ui);
                ui.add_space(self.theme.spacing_sm);

                StatusBar::new(&self.state, &self.theme).show(ui);
                ui.separator();
                ActivityPanel::new(&self.state, &self.theme).show(ui);
            });
    }

    /// Draw one frame
    pub fn render(&mut self, ctx: &egui::Context) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_content(ctx);

        if self.state.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT_INTERVAL);
        }
    }

    /// Remember engine, language and speed for the next start
    pub fn save_settings(&mut self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        self.config = self.state.to_config(&self.config);
        match self.config.save(&path) {
            Ok(()) => info!("Settings saved to {}", path.display()),
            Err(e) => warn!("Could not save settings: {}", e),
        }
    }
}

impl eframe::App for SpeakApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.stop();
        self.save_settings();
        info!("Text to Speech shutting down");
    }
}
