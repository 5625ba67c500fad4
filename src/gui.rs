// LogPoller - gui.rs
//
// Top-level eframe::App implementation.
// Wires the panels to AppState and owns the poll thread lifecycle.

use crate::app::poll::PollManager;
use crate::app::state::AppState;
use crate::core::model::PollProgress;
use crate::ui;
use std::time::Duration;

/// The LogPoller application.
pub struct LogPollerApp {
    pub state: AppState,
    pub poll_manager: PollManager,
    /// Appearance last pushed to the egui context, to avoid restyling every frame.
    applied_style: Option<(bool, f32)>,
}

impl LogPollerApp {
    /// Create a new application instance with the given state.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            poll_manager: PollManager::new(),
            applied_style: None,
        }
    }

    /// (Re)start the poll thread with the endpoint and settings in state.
    fn start_polling(&mut self) {
        match self.state.build_source() {
            Ok(source) => {
                self.poll_manager.start_polling(
                    source,
                    self.state.settings,
                    self.state.markup.clone(),
                );
                self.state.polling_active = true;
                self.state.paused = false;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot start polling");
                self.poll_manager.stop_polling();
                self.state.polling_active = false;
                self.state.status_message = format!("Cannot poll: {e}");
                self.state.show_options = true;
            }
        }
    }

    fn apply_style(&mut self, ctx: &egui::Context) {
        let wanted = (self.state.dark_mode, self.state.font_size);
        if self.applied_style == Some(wanted) {
            return;
        }
        ctx.set_visuals(if self.state.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        let size = self.state.font_size;
        ctx.style_mut(|style| {
            style
                .text_styles
                .insert(egui::TextStyle::Body, egui::FontId::proportional(size));
            style
                .text_styles
                .insert(egui::TextStyle::Button, egui::FontId::proportional(size));
            style
                .text_styles
                .insert(egui::TextStyle::Monospace, egui::FontId::monospace(size));
        });
        self.applied_style = Some(wanted);
    }

    fn drain_progress(&mut self) -> bool {
        let messages = self.poll_manager.poll_progress();
        let had_messages = !messages.is_empty();
        for msg in messages {
            match msg {
                PollProgress::Started {
                    endpoint,
                    interval_ms,
                } => {
                    self.state.status_message =
                        format!("Polling {endpoint} every {interval_ms} ms...");
                }
                PollProgress::Render { markup } => {
                    self.state.apply_render(markup);
                }
                PollProgress::Outcome(outcome) => {
                    if self.state.debug_mode {
                        tracing::debug!(request = %outcome.request(), outcome = ?outcome, "Cycle outcome");
                    }
                    self.state.apply_outcome(&outcome);
                }
                PollProgress::Stopped => {
                    self.state.polling_stopped();
                }
            }
        }
        had_messages
    }

    fn handle_requests(&mut self) {
        if self.state.request_toggle_pause {
            self.state.request_toggle_pause = false;
            if self.state.paused {
                tracing::info!("Polling resumed");
                self.state.pending_restart = true;
            } else {
                tracing::info!("Polling paused");
                self.poll_manager.stop_polling();
                self.state.paused = true;
                self.state.polling_stopped();
            }
        }

        if self.state.pending_restart {
            self.state.pending_restart = false;
            self.start_polling();
        }

        if self.state.request_poll_now {
            self.state.request_poll_now = false;
            if self.poll_manager.is_active() {
                self.poll_manager.poll_now();
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let has_lines = !self.state.lines.is_empty();
                    if ui
                        .add_enabled(has_lines, egui::Button::new("Copy Log Text"))
                        .clicked()
                    {
                        ctx.copy_text(self.state.visible_text());
                        self.state.status_message =
                            format!("Copied {} line(s) to clipboard.", self.state.lines.len());
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui.button("Options\u{2026}").clicked() {
                        self.state.reset_options_draft();
                        self.state.show_options = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.state.auto_scroll, "Follow newest line");
                    ui.checkbox(&mut self.state.dark_mode, "Dark theme");
                    ui.separator();
                    let n = self.state.warnings.len();
                    if ui
                        .add_enabled(n > 0, egui::Button::new(format!("Warnings ({n})")))
                        .clicked()
                    {
                        self.state.show_warnings = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.state.show_about = true;
                        ui.close_menu();
                    }
                });

                ui.separator();
                let pause_label = if self.state.paused {
                    "\u{25b6} Resume"
                } else {
                    "\u{23f8} Pause"
                };
                if ui.button(pause_label).clicked() {
                    self.state.request_toggle_pause = true;
                }
                if ui
                    .add_enabled(
                        self.state.polling_active,
                        egui::Button::new("\u{21bb} Poll now"),
                    )
                    .clicked()
                {
                    self.state.request_poll_now = true;
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.state.endpoint).weak());
                });
            });
        });
    }

    fn warnings_window(&mut self, ctx: &egui::Context) {
        if !self.state.show_warnings {
            return;
        }
        let mut open = true;
        egui::Window::new("Warnings")
            .open(&mut open)
            .collapsible(false)
            .default_width(480.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                    for warning in &self.state.warnings {
                        ui.label(warning);
                        ui.separator();
                    }
                });
                if ui.button("Clear").clicked() {
                    self.state.warnings.clear();
                    self.state.show_warnings = false;
                }
            });
        if !open {
            self.state.show_warnings = false;
        }
    }
}

impl eframe::App for LogPollerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_style(ctx);

        let had_messages = self.drain_progress();
        self.handle_requests();

        // Wake up on the poll cadence so results appear without user input.
        if had_messages {
            ctx.request_repaint();
        } else if self.state.polling_active {
            let wait = self
                .state
                .settings
                .interval
                .min(Duration::from_millis(250));
            ctx.request_repaint_after(wait);
        }

        self.menu_bar(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui::panels::status_bar::render(ui, &self.state);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui::panels::log_view::render(ui, &self.state);
        });

        ui::panels::options::render(ctx, &mut self.state);
        ui::panels::about::render(ctx, &mut self.state);
        self.warnings_window(ctx);
    }

    /// Stop the poll thread before the window closes.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.poll_manager.stop_polling();
        tracing::info!(cycles = self.state.cycles, "LogPoller exiting");
    }
}
