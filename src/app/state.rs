// LogPoller - app/state.rs
//
// Application state management. Holds the displayed snapshot, feed health,
// poll settings and the option-dialog draft.
// Owned by the eframe::App implementation.

use crate::app::fetch::{self, HttpSource};
use crate::app::poller::PollSettings;
use crate::core::markup::{self, RenderedLine};
use crate::core::model::{ComparisonMode, CycleOutcome, FeedStatus};
use crate::platform::config::AppConfig;
use crate::util::constants;
use crate::util::error::FetchError;
use std::time::Duration;

/// Editable copy of the poll options, committed by `AppState::apply_options`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsDraft {
    pub endpoint: String,
    pub interval_ms: u64,
    pub request_timeout_ms: u64,
    pub compare: ComparisonMode,
    pub max_in_flight: usize,
}

/// Top-level application state.
#[derive(Debug)]
pub struct AppState {
    /// Endpoint being polled.
    pub endpoint: String,

    /// Interval, comparison mode and overlap limit.
    pub settings: PollSettings,

    /// Per-request timeout.
    pub request_timeout_ms: u64,

    /// Markup currently shown in the log view.
    pub markup: String,

    /// `markup` split into coloured display lines.
    pub lines: Vec<RenderedLine>,

    pub feed: FeedStatus,

    /// Whether the poll thread is running.
    pub polling_active: bool,

    /// Polling stopped by the user (as opposed to never started).
    pub paused: bool,

    /// Completed cycles since launch.
    pub cycles: u64,

    /// Cycles that replaced the displayed content.
    pub renders: u64,

    /// Status message for the status bar.
    pub status_message: String,

    /// Non-fatal warnings (config problems, rejected options).
    pub warnings: Vec<String>,

    // -- Dialogs --
    pub show_options: bool,
    pub show_about: bool,
    pub show_warnings: bool,
    pub options_draft: OptionsDraft,

    // -- Appearance --
    pub dark_mode: bool,
    pub font_size: f32,
    /// Keep the view pinned to the newest line.
    pub auto_scroll: bool,

    // -- Requests from panels, handled by the App each frame --
    /// Restart polling with the current endpoint and settings.
    pub pending_restart: bool,
    pub request_poll_now: bool,
    pub request_toggle_pause: bool,

    /// Whether debug mode is enabled.
    pub debug_mode: bool,
}

impl AppState {
    /// Create initial state from validated configuration.
    pub fn new(config: &AppConfig, debug_mode: bool) -> Self {
        let settings = PollSettings {
            interval: Duration::from_millis(config.poll_interval_ms),
            compare: config.compare,
            max_in_flight: config.max_in_flight,
        };
        let mut state = Self {
            endpoint: fetch::parse_endpoint(&config.endpoint)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| config.endpoint.clone()),
            settings,
            request_timeout_ms: config.request_timeout_ms,
            markup: String::new(),
            lines: Vec::new(),
            feed: FeedStatus::default(),
            polling_active: false,
            paused: false,
            cycles: 0,
            renders: 0,
            status_message: "Connecting...".to_string(),
            warnings: Vec::new(),
            show_options: false,
            show_about: false,
            show_warnings: false,
            options_draft: OptionsDraft {
                endpoint: String::new(),
                interval_ms: 0,
                request_timeout_ms: 0,
                compare: ComparisonMode::default(),
                max_in_flight: 1,
            },
            dark_mode: config.dark_mode,
            font_size: config.font_size,
            auto_scroll: config.auto_scroll,
            pending_restart: true,
            request_poll_now: false,
            request_toggle_pause: false,
            debug_mode,
        };
        state.reset_options_draft();
        state
    }

    /// Build an HTTP source for the current endpoint and timeout.
    pub fn build_source(&self) -> Result<HttpSource, FetchError> {
        HttpSource::new(
            &self.endpoint,
            Duration::from_millis(self.request_timeout_ms),
        )
    }

    /// Replace the displayed content.
    pub fn apply_render(&mut self, markup: String) {
        self.lines = markup::render_lines(&markup);
        self.markup = markup;
    }

    /// Fold a completed cycle into feed health and the status message.
    pub fn apply_outcome(&mut self, outcome: &CycleOutcome) {
        if matches!(outcome, CycleOutcome::Discarded { .. }) {
            return;
        }
        self.cycles += 1;
        if matches!(outcome, CycleOutcome::Rendered { .. }) {
            self.renders += 1;
        }
        self.feed = self.feed.advance(outcome, chrono::Local::now());
        self.status_message = match &self.feed {
            FeedStatus::Waiting => "Connecting...".to_string(),
            FeedStatus::Live { .. } => format!("{} line(s) from {}", self.lines.len(), self.endpoint),
            FeedStatus::Unavailable { reason, .. } => match outcome {
                CycleOutcome::FetchFailed { error, .. } => error.to_string(),
                _ => reason.clone(),
            },
        };
    }

    /// Mark the poll thread as stopped.
    pub fn polling_stopped(&mut self) {
        self.polling_active = false;
        if self.paused {
            self.status_message = "Paused.".to_string();
        }
    }

    /// Copy the live settings into the options draft.
    pub fn reset_options_draft(&mut self) {
        self.options_draft = OptionsDraft {
            endpoint: self.endpoint.clone(),
            interval_ms: self.settings.interval.as_millis() as u64,
            request_timeout_ms: self.request_timeout_ms,
            compare: self.settings.compare,
            max_in_flight: self.settings.max_in_flight,
        };
    }

    /// Validate the options draft and, if it changed anything, commit it and
    /// request a poll restart.
    pub fn apply_options(&mut self) -> Result<bool, FetchError> {
        let draft = self.options_draft.clone();
        let endpoint = fetch::parse_endpoint(draft.endpoint.trim())?.to_string();

        let interval_ms = draft.interval_ms.clamp(
            constants::MIN_POLL_INTERVAL_MS,
            constants::MAX_POLL_INTERVAL_MS,
        );
        let timeout_ms = draft.request_timeout_ms.clamp(
            constants::MIN_REQUEST_TIMEOUT_MS,
            constants::MAX_REQUEST_TIMEOUT_MS,
        );
        let settings = PollSettings {
            interval: Duration::from_millis(interval_ms),
            compare: draft.compare,
            max_in_flight: draft.max_in_flight.clamp(1, constants::ABSOLUTE_MAX_IN_FLIGHT),
        };

        let changed = endpoint != self.endpoint
            || settings != self.settings
            || timeout_ms != self.request_timeout_ms;
        if changed {
            if endpoint != self.endpoint {
                // A new endpoint's content has no relation to what is shown.
                self.apply_render(String::new());
                self.feed = FeedStatus::default();
            }
            tracing::info!(
                endpoint = %endpoint,
                interval_ms,
                timeout_ms,
                compare = settings.compare.key(),
                max_in_flight = settings.max_in_flight,
                "Poll options changed"
            );
            self.endpoint = endpoint;
            self.settings = settings;
            self.request_timeout_ms = timeout_ms;
            self.pending_restart = !self.paused;
        }
        self.reset_options_draft();
        Ok(changed)
    }

    /// Plain-text copy of the displayed log, one line per display line.
    pub fn visible_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::RequestId;

    fn state() -> AppState {
        AppState::new(&AppConfig::default(), false)
    }

    #[test]
    fn test_new_state_requests_initial_start() {
        let s = state();
        assert!(s.pending_restart);
        assert_eq!(s.endpoint, constants::DEFAULT_ENDPOINT);
        assert_eq!(s.options_draft.interval_ms, constants::DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(s.feed, FeedStatus::Waiting);
    }

    #[test]
    fn test_render_then_failure_keeps_content_and_marks_unavailable() {
        let mut s = state();
        s.apply_render("<div style=\"color:red\">ERROR boom</div>".to_string());
        s.apply_outcome(&CycleOutcome::Rendered {
            request: RequestId::new(1),
            bytes: 40,
        });
        assert!(matches!(s.feed, FeedStatus::Live { .. }));
        assert_eq!(s.visible_text(), "ERROR boom");

        s.apply_outcome(&CycleOutcome::FetchFailed {
            request: RequestId::new(2),
            error: FetchError::Server {
                endpoint: s.endpoint.clone(),
                status: 503,
            },
        });
        assert!(s.feed.is_unavailable());
        assert_eq!(s.visible_text(), "ERROR boom");
        assert!(s.status_message.contains("503"));
        assert_eq!(s.cycles, 2);
        assert_eq!(s.renders, 1);
    }

    #[test]
    fn test_discarded_outcome_is_not_counted() {
        let mut s = state();
        s.apply_outcome(&CycleOutcome::Discarded {
            request: RequestId::new(1),
            latest: Some(RequestId::new(2)),
        });
        assert_eq!(s.cycles, 0);
        assert_eq!(s.feed, FeedStatus::Waiting);
    }

    #[test]
    fn test_apply_options_rejects_bad_endpoint() {
        let mut s = state();
        s.pending_restart = false;
        s.options_draft.endpoint = "not a url".to_string();
        assert!(matches!(
            s.apply_options(),
            Err(FetchError::InvalidEndpoint { .. })
        ));
        assert!(!s.pending_restart);
        assert_eq!(s.endpoint, constants::DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_apply_options_clamps_and_requests_restart() {
        let mut s = state();
        s.pending_restart = false;
        s.apply_render("old".to_string());
        s.options_draft.endpoint = "http://logs.local:8080/log_stream".to_string();
        s.options_draft.interval_ms = 1;
        s.options_draft.compare = ComparisonMode::TextContent;

        assert!(s.apply_options().unwrap());
        assert!(s.pending_restart);
        assert_eq!(
            s.settings.interval,
            Duration::from_millis(constants::MIN_POLL_INTERVAL_MS)
        );
        assert_eq!(s.settings.compare, ComparisonMode::TextContent);
        assert!(s.markup.is_empty(), "content from the old endpoint is cleared");
    }

    #[test]
    fn test_apply_options_unchanged_is_a_no_op() {
        let mut s = state();
        s.pending_restart = false;
        assert!(!s.apply_options().unwrap());
        assert!(!s.pending_restart);
    }

    #[test]
    fn test_options_while_paused_do_not_restart() {
        let mut s = state();
        s.pending_restart = false;
        s.paused = true;
        s.options_draft.interval_ms = 2_000;
        assert!(s.apply_options().unwrap());
        assert!(!s.pending_restart);
    }
}
