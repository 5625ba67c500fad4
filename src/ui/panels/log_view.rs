// LogPoller - ui/panels/log_view.rs
//
// Central log view. Each display line is one monospace row coloured by its
// markup colour or detected severity. `show_rows` lays out only the visible
// rows, so large snapshots scroll at constant cost.

use crate::app::state::AppState;
use crate::core::model::FeedStatus;
use crate::ui::theme;

/// Render the log view (central area).
pub fn render(ui: &mut egui::Ui, state: &AppState) {
    if state.lines.is_empty() {
        ui.centered_and_justified(|ui| {
            let hint = match &state.feed {
                FeedStatus::Waiting => format!("Waiting for {}\u{2026}", state.endpoint),
                FeedStatus::Live { .. } => "The log is empty.".to_string(),
                FeedStatus::Unavailable { reason, .. } => {
                    format!("Log unavailable ({reason}).\nRetrying every poll interval.")
                }
            };
            ui.label(egui::RichText::new(hint).weak());
        });
        return;
    }

    let row_height = ui.text_style_height(&egui::TextStyle::Monospace);

    egui::ScrollArea::both()
        .auto_shrink([false; 2])
        .stick_to_bottom(state.auto_scroll)
        .show_rows(ui, row_height, state.lines.len(), |ui, row_range| {
            for line in &state.lines[row_range] {
                let colour = theme::line_colour(&line.style, state.dark_mode);
                // Blank rows still need a glyph to keep their height.
                let text = if line.text.is_empty() { " " } else { &line.text };
                ui.add(
                    egui::Label::new(egui::RichText::new(text).monospace().color(colour))
                        .extend(),
                );
            }
        });
}
