//! Text area holding what will be spoken

use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText};

pub struct TextInput<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> TextInput<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Enter text to speak:").strong().color(self.theme.text_primary));

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("text_input_scroll")
                    .max_height(260.0)
                    .show(ui, |ui| {
                        let text_edit = egui::TextEdit::multiline(&mut self.state.input_text)
                            .hint_text("Type or paste text here...")
                            .desired_rows(10)
                            .desired_width(f32::INFINITY)
                            .id(egui::Id::new("text_to_speak"));

                        let response = ui.add(text_edit);
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Text to speak")
                        });

                        // Ctrl+Enter speaks without leaving the keyboard
                        if response.has_focus() && ui.input(|i| i.modifiers.command && i.key_pressed(Key::Enter)) {
                            self.state.toggle_playback();
                        }
                    });
            });

        let chars = self.state.input_text.chars().count();
        ui.label(
            RichText::new(format!("{} characters", chars))
                .small()
                .color(self.theme.text_muted),
        );
    }
}
