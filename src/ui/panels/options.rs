// LogPoller - ui/panels/options.rs
//
// Options dialog, opened from Edit > Options.
//
// Sections:
//   1. Appearance  - font size, auto-scroll (take effect immediately)
//   2. Polling     - endpoint, interval, timeout, comparison, overlap limit
//
// Polling changes are edited in `state.options_draft` and only committed by
// Apply, which validates the endpoint and restarts the poll loop.

use crate::app::state::AppState;
use crate::core::model::ComparisonMode;
use crate::ui::theme;
use crate::util::constants::{
    ABSOLUTE_MAX_IN_FLIGHT, DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MAX_POLL_INTERVAL_MS,
    MAX_REQUEST_TIMEOUT_MS, MIN_FONT_SIZE, MIN_POLL_INTERVAL_MS, MIN_REQUEST_TIMEOUT_MS,
};

/// Render the Options dialog (if `state.show_options` is true).
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_options {
        return;
    }

    let mut open = true;
    let mut apply = false;
    let mut cancel = false;
    egui::Window::new("Options")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(theme::OPTIONS_WIDTH)
        .show(ctx, |ui| {
            // =========================================================
            // Section 1 - Appearance
            // =========================================================
            ui.heading("Appearance");
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Font size:");
                ui.add(
                    egui::Slider::new(&mut state.font_size, MIN_FONT_SIZE..=MAX_FONT_SIZE)
                        .step_by(0.5)
                        .suffix(" pt"),
                );
                if (state.font_size - DEFAULT_FONT_SIZE).abs() > 0.1
                    && ui
                        .small_button("Reset")
                        .on_hover_text("Reset to the built-in default (14 pt)")
                        .clicked()
                {
                    state.font_size = DEFAULT_FONT_SIZE;
                }
            });
            ui.checkbox(&mut state.auto_scroll, "Follow newest line");
            ui.checkbox(&mut state.dark_mode, "Dark theme");

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(6.0);

            // =========================================================
            // Section 2 - Polling
            // =========================================================
            ui.heading("Polling");
            ui.add_space(2.0);
            ui.label(
                egui::RichText::new("Changes take effect when you press Apply.")
                    .small()
                    .weak(),
            );
            ui.add_space(8.0);

            let draft = &mut state.options_draft;
            egui::Grid::new("options_poll_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Endpoint:");
                    ui.add(
                        egui::TextEdit::singleline(&mut draft.endpoint)
                            .desired_width(260.0)
                            .hint_text("http://host/log_stream"),
                    );
                    ui.end_row();

                    ui.label("Poll interval:");
                    ui.add(
                        egui::Slider::new(
                            &mut draft.interval_ms,
                            MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS,
                        )
                        .logarithmic(true)
                        .suffix(" ms"),
                    );
                    ui.end_row();

                    ui.label("Request timeout:");
                    ui.add(
                        egui::Slider::new(
                            &mut draft.request_timeout_ms,
                            MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS,
                        )
                        .logarithmic(true)
                        .suffix(" ms"),
                    );
                    ui.end_row();

                    ui.label("Change detection:");
                    egui::ComboBox::from_id_salt("options_compare")
                        .selected_text(draft.compare.label())
                        .show_ui(ui, |ui| {
                            for mode in ComparisonMode::all() {
                                ui.selectable_value(&mut draft.compare, *mode, mode.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Max requests in flight:");
                    ui.add(egui::Slider::new(
                        &mut draft.max_in_flight,
                        1..=ABSOLUTE_MAX_IN_FLIGHT,
                    ));
                    ui.end_row();
                });

            ui.add_space(10.0);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Apply").clicked() {
                    apply = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if apply {
        match state.apply_options() {
            Ok(true) => {
                state.status_message = "Options applied.".to_string();
                state.show_options = false;
            }
            Ok(false) => state.show_options = false,
            Err(e) => {
                tracing::warn!(error = %e, "Options rejected");
                state.status_message = format!("Options not applied: {e}");
            }
        }
    }
    if cancel || !open {
        state.reset_options_draft();
        state.show_options = false;
    }
}
