// LogPoller - app/poller.rs
//
// LogPoller: fetch a snapshot on a fixed interval and replace a display
// region's content when the snapshot differs from what is displayed.
//
// Architecture:
//   - `LogPoller` owns the source, the clock, the tick schedule and the
//     request sequencer. It borrows the region for one cycle at a time.
//   - Synchronous drivers call `run_due` (or `poll_once`); fetches are
//     serialised.
//   - The threaded driver (app::poll) calls `fire_tick` + `begin_request`,
//     runs the fetch on a worker, then `complete_request`. Fetches may then
//     overlap; the sequencer discards responses older than the last applied
//     one.
//
// Failures never escape a cycle: fetch and render errors become a
// `CycleOutcome`, are logged, and are passed to the status callback. The
// schedule keeps running regardless.

use crate::app::fetch::SnapshotSource;
use crate::core::markup;
use crate::core::model::{ComparisonMode, CycleOutcome, LogSnapshot, RequestId};
use crate::core::region::DisplayRegion;
use crate::core::schedule::{Clock, TickSchedule};
use crate::core::sequence::{Acceptance, PollerState, RequestSequencer};
use crate::util::constants::{DEFAULT_MAX_IN_FLIGHT, DEFAULT_POLL_INTERVAL_MS};
use crate::util::error::FetchError;
use crate::util::logging::preview;
use std::time::Duration;

/// Receives every cycle outcome, in completion order.
pub type StatusCallback = Box<dyn FnMut(&CycleOutcome) + Send>;

/// Tunables for one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub compare: ComparisonMode,
    /// Only used by the threaded driver; ticks beyond it are skipped.
    pub max_in_flight: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            compare: ComparisonMode::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

pub struct LogPoller<S, C> {
    source: S,
    clock: C,
    settings: PollSettings,
    schedule: TickSchedule,
    sequencer: RequestSequencer,
    on_status: Option<StatusCallback>,
}

impl<S: SnapshotSource, C: Clock> LogPoller<S, C> {
    pub fn new(source: S, clock: C, settings: PollSettings) -> Self {
        Self {
            source,
            clock,
            settings,
            schedule: TickSchedule::new(settings.interval),
            sequencer: RequestSequencer::new(),
            on_status: None,
        }
    }

    /// Report every outcome to `callback`.
    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.on_status = Some(callback);
        self
    }

    /// Arm the schedule: the first tick is due immediately, then one per
    /// interval.
    pub fn start(&mut self) {
        self.schedule.arm(self.clock.now());
        tracing::info!(
            endpoint = self.source.endpoint(),
            interval_ms = self.settings.interval.as_millis() as u64,
            compare = %self.settings.compare,
            "Polling started"
        );
    }

    /// Disarm the schedule and cancel in-flight requests; their responses
    /// will be discarded.
    pub fn stop(&mut self) {
        self.schedule.disarm();
        let in_flight = self.sequencer.in_flight();
        self.sequencer.cancel_outstanding();
        tracing::info!(
            endpoint = self.source.endpoint(),
            cancelled = in_flight,
            "Polling stopped"
        );
    }

    /// Make the next tick due now. Has no effect when stopped.
    pub fn trigger_now(&mut self) {
        if self.schedule.is_armed() {
            self.schedule.arm(self.clock.now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_armed()
    }

    pub fn is_tick_due(&self) -> bool {
        self.schedule.is_due(self.clock.now())
    }

    /// Time until the next tick, or `None` when stopped.
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        self.schedule.time_until_due(self.clock.now())
    }

    /// Consume a due tick. Returns false if none was due.
    pub fn fire_tick(&mut self) -> bool {
        self.schedule.fire(self.clock.now())
    }

    /// Run one cycle if a tick is due (synchronous driver).
    pub fn run_due(&mut self, region: &mut dyn DisplayRegion) -> Option<CycleOutcome> {
        if !self.fire_tick() {
            return None;
        }
        Some(self.poll_once(region))
    }

    /// One full fetch-compare-render cycle, independent of the schedule.
    pub fn poll_once(&mut self, region: &mut dyn DisplayRegion) -> CycleOutcome {
        let request = self.begin_request();
        let result = self.source.fetch();
        self.complete_request(request, result, region)
    }

    /// Tag a new request. The caller performs the fetch and hands the
    /// result to `complete_request`.
    pub fn begin_request(&mut self) -> RequestId {
        let request = self.sequencer.issue();
        tracing::trace!(
            %request,
            in_flight = self.sequencer.in_flight(),
            "Fetch issued"
        );
        request
    }

    /// Apply the result of `request` to `region`.
    pub fn complete_request(
        &mut self,
        request: RequestId,
        result: Result<LogSnapshot, FetchError>,
        region: &mut dyn DisplayRegion,
    ) -> CycleOutcome {
        let outcome = match self.sequencer.complete(request) {
            Acceptance::Stale { latest } => {
                tracing::debug!(%request, ?latest, "Discarding stale response");
                CycleOutcome::Discarded { request, latest }
            }
            Acceptance::Fresh => match result {
                Ok(snapshot) => {
                    let outcome = self.render(request, snapshot, region);
                    if matches!(
                        outcome,
                        CycleOutcome::Rendered { .. } | CycleOutcome::Unchanged { .. }
                    ) {
                        self.sequencer.mark_applied(request);
                    }
                    outcome
                }
                Err(error) => {
                    tracing::warn!(%request, error = %error, "Fetch failed; display left unchanged");
                    CycleOutcome::FetchFailed { request, error }
                }
            },
        };
        if let Some(callback) = self.on_status.as_mut() {
            callback(&outcome);
        }
        outcome
    }

    fn render(
        &self,
        request: RequestId,
        snapshot: LogSnapshot,
        region: &mut dyn DisplayRegion,
    ) -> CycleOutcome {
        let displayed = match region.content() {
            Ok(displayed) => displayed,
            Err(error) => {
                tracing::error!(%request, error = %error, "Cannot read display region");
                return CycleOutcome::RenderFailed { request, error };
            }
        };

        if markup::snapshots_equal(displayed, snapshot.as_str(), self.settings.compare) {
            tracing::debug!(%request, "No new log content");
            return CycleOutcome::Unchanged { request };
        }

        let bytes = snapshot.len();
        match region.replace(snapshot.as_str()) {
            Ok(()) => {
                tracing::debug!(
                    %request,
                    bytes,
                    preview = preview(snapshot.as_str()),
                    "Display updated"
                );
                CycleOutcome::Rendered { request, bytes }
            }
            Err(error) => {
                tracing::error!(%request, error = %error, "Cannot update display region");
                CycleOutcome::RenderFailed { request, error }
            }
        }
    }

    pub fn state(&self) -> PollerState {
        self.sequencer.state()
    }

    /// Number of requests issued but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.sequencer.in_flight()
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
