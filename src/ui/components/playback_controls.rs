//! Speed slider and the PLAY/STOP toggle

use crate::speech::{MAX_SPEED, MIN_SPEED};
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct PlaybackControls<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> PlaybackControls<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            self.show_speed(ui);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                self.show_toggle(ui);
            });
        });
    }

    fn show_speed(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Speed:").strong().color(self.theme.text_primary));

        let slider = egui::Slider::new(&mut self.state.speed, MIN_SPEED..=MAX_SPEED)
            .step_by(0.1)
            .show_value(false);
        let response = ui.add(slider);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Slider, true, "Speech speed")
        });

        ui.label(
            RichText::new(format!("{:.1}x", self.state.speed))
                .family(egui::FontFamily::Monospace)
                .color(self.theme.text_secondary),
        );
    }

    fn show_toggle(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_busy();
        let (text, label, fill) = if busy {
            ("■ STOP", "Stop speech", self.theme.stop)
        } else {
            ("▶ PLAY", "Play speech", self.theme.primary)
        };
        let enabled = busy || self.state.selected_engine().is_some();

        let button = egui::Button::new(RichText::new(text).size(16.0).strong().color(egui::Color32::WHITE))
            .min_size(Vec2::new(140.0, 40.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label));

        if response.clicked() {
            self.state.toggle_playback();
        }
    }
}
