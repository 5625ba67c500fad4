// LogPoller - ui/panels/status_bar.rs
//
// Bottom status bar: feed badge, status message, last-change time and
// cycle counters.

use crate::app::state::AppState;
use crate::core::model::FeedStatus;
use crate::ui::theme;

/// Render the status bar contents.
pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.horizontal(|ui| {
        let badge = if state.paused {
            egui::RichText::new(" \u{23f8} PAUSED ").strong().color(theme::IDLE_COLOUR)
        } else {
            match &state.feed {
                FeedStatus::Waiting => egui::RichText::new(" \u{25cb} CONNECTING ")
                    .strong()
                    .color(theme::IDLE_COLOUR),
                FeedStatus::Live { .. } => egui::RichText::new(" \u{25cf} LIVE ")
                    .strong()
                    .color(theme::LIVE_COLOUR)
                    .background_color(theme::LIVE_BG),
                FeedStatus::Unavailable { .. } => {
                    egui::RichText::new(" \u{26a0} LOG UNAVAILABLE ")
                        .strong()
                        .color(theme::UNAVAILABLE_COLOUR)
                        .background_color(theme::UNAVAILABLE_BG)
                }
            }
        };
        ui.label(badge);
        ui.separator();
        ui.label(&state.status_message);

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(format!("{} cycles", state.cycles));
            match &state.feed {
                FeedStatus::Live {
                    last_change: Some(at),
                    ..
                } => {
                    ui.separator();
                    ui.label(format!("Updated {}", at.format("%H:%M:%S")));
                }
                FeedStatus::Unavailable {
                    since,
                    consecutive_failures,
                    ..
                } => {
                    ui.separator();
                    ui.label(format!(
                        "{consecutive_failures} failed since {}",
                        since.format("%H:%M:%S")
                    ));
                }
                _ => {}
            }
            if !state.warnings.is_empty() {
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{} warning(s)", state.warnings.len()))
                        .color(theme::IDLE_COLOUR),
                );
            }
        });
    });
}
