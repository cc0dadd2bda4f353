//! Status line and activity log

use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText, ScrollArea};

pub struct StatusBar<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let status = &self.state.status;
        let color = self.theme.status_color(status.level);

        ui.horizontal(|ui| {
            let (dot_rect, _) = ui.allocate_exact_size(egui::Vec2::splat(10.0), egui::Sense::hover());
            ui.painter().circle_filled(dot_rect.center(), 5.0, color);

            let response = ui.label(RichText::new(&status.text).color(color));
            response.widget_info(|| {
                egui::WidgetInfo::labeled(
                    egui::WidgetType::Label,
                    true,
                    format!("Status: {}", status.text),
                )
            });
        });
    }
}

/// Collapsible, timestamped activity log
pub struct ActivityPanel<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> ActivityPanel<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new(format!("Activity Log ({})", self.state.activity.len()))
            .id_salt("activity_log")
            .default_open(false)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("activity_log_scroll")
                    .max_height(150.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for entry in self.state.activity.entries() {
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(entry.time.format("%H:%M:%S").to_string())
                                        .small()
                                        .family(egui::FontFamily::Monospace)
                                        .color(self.theme.text_muted),
                                );
                                ui.label(
                                    RichText::new(&entry.message)
                                        .small()
                                        .color(self.theme.text_secondary),
                                );
                            });
                        }
                    });
            });
    }
}
