//! Engine and language pickers

use crate::speech::{language_by_code, EngineChoice, EngineStatus, LANGUAGES};
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

/// Engine combo box, plus the language combo box for the online engine
pub struct EnginePicker<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> EnginePicker<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let selected = self.state.selected_engine();

        ui.horizontal(|ui| {
            ui.label(RichText::new("TTS Engine:").strong().color(self.theme.text_primary));

            let selected_text = match selected {
                Some(engine) => self.entry_text(engine),
                None => "No engines available".to_string(),
            };

            let mut choice = None;
            let response = egui::ComboBox::from_id_salt("engine_picker")
                .selected_text(selected_text)
                .width(260.0)
                .show_ui(ui, |ui| {
                    for engine in EngineChoice::ALL {
                        let available = self.state.is_engine_available(engine);
                        let item = egui::SelectableLabel::new(
                            selected == Some(engine),
                            self.entry_text(engine),
                        );
                        let response = ui.add_enabled(available, item);
                        if response.clicked() {
                            choice = Some(engine);
                        }
                        if !available {
                            response.on_disabled_hover_text(engine.install_hint());
                        }
                    }
                })
                .response;
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::ComboBox, true, "TTS engine")
            });

            if let Some(engine) = choice {
                self.state.select_engine(engine);
            }

            if self.state.selected_engine().is_some_and(|e| e.uses_language()) {
                ui.add_space(self.theme.spacing);
                ui.label(RichText::new("Language:").strong().color(self.theme.text_primary));

                let current = language_by_code(&self.state.language)
                    .map(|l| l.name)
                    .unwrap_or("English");

                let response = egui::ComboBox::from_id_salt("language_picker")
                    .selected_text(current)
                    .width(140.0)
                    .show_ui(ui, |ui| {
                        for language in LANGUAGES.iter() {
                            ui.selectable_value(
                                &mut self.state.language,
                                language.code.to_string(),
                                language.name,
                            );
                        }
                    })
                    .response;
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::ComboBox, true, "Language")
                });
            }
        });

        if let Some(engine) = self.state.selected_engine() {
            if self.state.engine_status(engine) == EngineStatus::ModelMissing {
                ui.label(
                    RichText::new("Voice model not downloaded. Place the Piper voice files in the voice directory.")
                        .small()
                        .color(self.theme.warning),
                );
            }
        }
    }

    fn entry_text(&self, engine: EngineChoice) -> String {
        let status = self.state.engine_status(engine);
        format!("{} ({})", engine.display_name(), status.label(engine))
    }
}
