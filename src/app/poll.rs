// LogPoller - app/poll.rs
//
// Background polling for the GUI.
//
// Architecture:
//   - `PollManager` lives on the UI thread and exposes start/stop/poll, the
//     same shape as the other background managers.
//   - `run_poll_loop` runs on a background thread. It owns the LogPoller, the
//     tick schedule and the request sequencer.
//   - Each tick spawns a short-lived fetch worker that sends
//     `(RequestId, Result)` back to the poll thread, so a slow endpoint never
//     delays the schedule. At most `max_in_flight` fetches run at once;
//     further ticks are skipped until one completes.
//   - Comparison happens on the poll thread against a mirror of what the UI
//     displays (`ChannelRegion`). Only changed snapshots cross to the UI, as
//     `PollProgress::Render`; the UI thread is the only writer of the view.
//   - An `Arc<AtomicBool>` cancel flag stops the loop; the loop waits in
//     slices of POLL_CANCEL_CHECK_INTERVAL_MS so stop is prompt.
//
// The loop exits when cancelled or when the UI side of the channel is gone.

use crate::app::fetch::SnapshotSource;
use crate::app::poller::{LogPoller, PollSettings};
use crate::core::model::{CycleOutcome, LogSnapshot, PollProgress, RequestId};
use crate::core::region::DisplayRegion;
use crate::core::schedule::SystemClock;
use crate::util::constants::{MAX_POLL_MESSAGES_PER_FRAME, POLL_CANCEL_CHECK_INTERVAL_MS};
use crate::util::error::{FetchError, RenderError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// PollManager
// =============================================================================

/// Manages a poll loop on a background thread.
pub struct PollManager {
    /// Channel receiver for the UI to poll progress messages.
    pub progress_rx: Option<mpsc::Receiver<PollProgress>>,
    /// Cancel flag shared with the background thread.
    cancel_flag: Option<Arc<AtomicBool>>,
    /// Set by the UI to make the next tick fire immediately.
    poll_now_flag: Option<Arc<AtomicBool>>,
}

impl PollManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            cancel_flag: None,
            poll_now_flag: None,
        }
    }

    /// Start polling `source`. If a loop is already running it is stopped
    /// first.
    ///
    /// `displayed` is the markup the UI currently shows, so a restart does not
    /// re-render identical content.
    pub fn start_polling<S>(&mut self, source: S, settings: PollSettings, displayed: String)
    where
        S: SnapshotSource + Clone + Send + 'static,
    {
        self.stop_polling();

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let poll_now = Arc::new(AtomicBool::new(false));

        self.progress_rx = Some(rx);
        self.cancel_flag = Some(Arc::clone(&cancel));
        self.poll_now_flag = Some(Arc::clone(&poll_now));

        let endpoint = source.endpoint().to_string();
        std::thread::spawn(move || {
            run_poll_loop(source, settings, displayed, tx, cancel, poll_now);
        });

        tracing::info!(endpoint = %endpoint, "Poll thread started");
    }

    /// Request the background thread to stop.
    ///
    /// The thread exits within `POLL_CANCEL_CHECK_INTERVAL_MS`; responses to
    /// requests still in flight are discarded.
    pub fn stop_polling(&mut self) {
        if let Some(flag) = &self.cancel_flag {
            flag.store(true, Ordering::SeqCst);
        }
        self.cancel_flag = None;
        self.poll_now_flag = None;
        self.progress_rx = None;
    }

    /// Fire the next tick immediately instead of waiting for the interval.
    pub fn poll_now(&self) {
        if let Some(flag) = &self.poll_now_flag {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Returns `true` if a poll thread is currently active.
    pub fn is_active(&self) -> bool {
        self.cancel_flag.is_some()
    }

    /// Drain pending progress messages without blocking, up to the per-frame
    /// budget.
    pub fn poll_progress(&self) -> Vec<PollProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while messages.len() < MAX_POLL_MESSAGES_PER_FRAME {
                match rx.try_recv() {
                    Ok(msg) => messages.push(msg),
                    Err(_) => break,
                }
            }
        }
        messages
    }
}

impl Default for PollManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollManager {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

// =============================================================================
// ChannelRegion
// =============================================================================

/// Display region whose real content lives on the UI thread.
///
/// Keeps a mirror of the last markup sent so comparison can happen on the
/// poll thread; `replace` forwards the new markup as `PollProgress::Render`.
pub struct ChannelRegion {
    mirror: String,
    tx: mpsc::Sender<PollProgress>,
}

impl ChannelRegion {
    pub fn new(tx: mpsc::Sender<PollProgress>, displayed: String) -> Self {
        Self {
            mirror: displayed,
            tx,
        }
    }
}

impl DisplayRegion for ChannelRegion {
    fn content(&self) -> Result<&str, RenderError> {
        Ok(&self.mirror)
    }

    fn replace(&mut self, markup: &str) -> Result<(), RenderError> {
        self.tx
            .send(PollProgress::Render {
                markup: markup.to_string(),
            })
            .map_err(|_| RenderError::Detached {
                region: "log view".to_string(),
            })?;
        self.mirror.clear();
        self.mirror.push_str(markup);
        Ok(())
    }
}

// =============================================================================
// Background poll loop
// =============================================================================

fn run_poll_loop<S>(
    source: S,
    settings: PollSettings,
    displayed: String,
    tx: mpsc::Sender<PollProgress>,
    cancel: Arc<AtomicBool>,
    poll_now: Arc<AtomicBool>,
) where
    S: SnapshotSource + Clone + Send + 'static,
{
    let endpoint = source.endpoint().to_string();
    let mut region = ChannelRegion::new(tx.clone(), displayed);
    let mut poller = LogPoller::new(source, SystemClock::new(), settings);
    let (result_tx, result_rx) = mpsc::channel::<(RequestId, Result<LogSnapshot, FetchError>)>();
    let check = Duration::from_millis(POLL_CANCEL_CHECK_INTERVAL_MS);

    if tx
        .send(PollProgress::Started {
            endpoint,
            interval_ms: settings.interval.as_millis() as u64,
        })
        .is_err()
    {
        return;
    }
    poller.start();

    loop {
        if cancel.load(Ordering::SeqCst) {
            poller.stop();
            let _ = tx.send(PollProgress::Stopped);
            return;
        }

        if poll_now.swap(false, Ordering::SeqCst) {
            poller.trigger_now();
        }

        if poller.fire_tick() {
            if poller.in_flight() >= settings.max_in_flight.max(1) {
                tracing::debug!(
                    in_flight = poller.in_flight(),
                    "Previous fetches still running; skipping tick"
                );
            } else {
                let request = poller.begin_request();
                let worker_source = poller.source().clone();
                let result_tx = result_tx.clone();
                std::thread::spawn(move || {
                    let result = worker_source.fetch();
                    // Poll thread gone: the response is simply dropped.
                    let _ = result_tx.send((request, result));
                });
            }
        }

        let wait = poller.time_until_next_tick().unwrap_or(check).min(check);
        match result_rx.recv_timeout(wait) {
            Ok((request, result)) => {
                let outcome = poller.complete_request(request, result, &mut region);
                let detached = matches!(
                    outcome,
                    CycleOutcome::RenderFailed {
                        error: RenderError::Detached { .. },
                        ..
                    }
                );
                if detached || tx.send(PollProgress::Outcome(outcome)).is_err() {
                    tracing::debug!("UI channel closed; poll thread exiting");
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // The loop holds a sender, so this cannot happen; treat it as a
            // plain wakeup.
            Err(RecvTimeoutError::Disconnected) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ComparisonMode;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Thread-safe scripted source; repeats its last response once the
    /// script runs out.
    #[derive(Clone)]
    struct SharedSource {
        script: Arc<Mutex<VecDeque<Result<String, u16>>>>,
        last: Arc<Mutex<Option<Result<String, u16>>>>,
    }

    impl SharedSource {
        fn new(script: Vec<Result<&str, u16>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(
                    script.into_iter().map(|r| r.map(str::to_string)).collect(),
                )),
                last: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl SnapshotSource for SharedSource {
        fn fetch(&self) -> Result<LogSnapshot, FetchError> {
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if next.is_some() {
                *last = next;
            }
            match last.clone() {
                Some(Ok(body)) => Ok(LogSnapshot::new(body)),
                Some(Err(status)) => Err(FetchError::Server {
                    endpoint: self.endpoint().to_string(),
                    status,
                }),
                None => Err(FetchError::Network {
                    endpoint: self.endpoint().to_string(),
                    reason: "empty script".to_string(),
                }),
            }
        }

        fn endpoint(&self) -> &str {
            "http://test/log_stream"
        }
    }

    /// Source whose fetches take `delay`, recording how many run at once.
    #[derive(Clone)]
    struct SlowSource {
        delay: Duration,
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl SlowSource {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                active: Arc::new(AtomicUsize::new(0)),
                max_active: Arc::new(AtomicUsize::new(0)),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SnapshotSource for SlowSource {
        fn fetch(&self) -> Result<LogSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(LogSnapshot::new("slow".to_string()))
        }

        fn endpoint(&self) -> &str {
            "http://test/log_stream"
        }
    }

    fn settings() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(50),
            compare: ComparisonMode::Exact,
            max_in_flight: 2,
        }
    }

    /// Collect messages until `done` matches one or the deadline passes.
    fn collect_until(
        manager: &PollManager,
        timeout: Duration,
        done: impl Fn(&PollProgress) -> bool,
    ) -> Vec<PollProgress> {
        let rx = manager.progress_rx.as_ref().unwrap();
        let deadline = Instant::now() + timeout;
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            if let Ok(msg) = rx.recv_timeout(Duration::from_millis(20)) {
                let finished = done(&msg);
                seen.push(msg);
                if finished {
                    break;
                }
            }
        }
        seen
    }

    #[test]
    fn test_channel_region_mirrors_and_forwards() {
        let (tx, rx) = mpsc::channel();
        let mut region = ChannelRegion::new(tx, "old".to_string());
        assert_eq!(region.content().unwrap(), "old");
        region.replace("new").unwrap();
        assert_eq!(region.content().unwrap(), "new");
        assert!(matches!(rx.try_recv(), Ok(PollProgress::Render { markup }) if markup == "new"));
    }

    #[test]
    fn test_channel_region_detached_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut region = ChannelRegion::new(tx, String::new());
        assert!(matches!(
            region.replace("x"),
            Err(RenderError::Detached { .. })
        ));
        assert_eq!(region.content().unwrap(), "");
    }

    #[test]
    fn test_manager_renders_first_snapshot_and_stops() {
        let mut manager = PollManager::new();
        manager.start_polling(SharedSource::new(vec![Ok("<div>log A</div>")]), settings(), String::new());
        assert!(manager.is_active());

        let seen = collect_until(&manager, Duration::from_secs(5), |m| {
            matches!(m, PollProgress::Render { .. })
        });
        assert!(matches!(seen.first(), Some(PollProgress::Started { .. })));
        assert!(
            seen.iter().any(|m| matches!(m, PollProgress::Render { markup } if markup == "<div>log A</div>")),
            "no render in {seen:?}"
        );

        manager.stop_polling();
        assert!(!manager.is_active());
        assert!(manager.poll_progress().is_empty());
    }

    #[test]
    fn test_manager_skips_render_when_already_displayed() {
        let mut manager = PollManager::new();
        manager.start_polling(
            SharedSource::new(vec![Ok("same")]),
            settings(),
            "same".to_string(),
        );
        let seen = collect_until(&manager, Duration::from_secs(5), |m| {
            matches!(m, PollProgress::Outcome(_))
        });
        assert!(seen
            .iter()
            .any(|m| matches!(m, PollProgress::Outcome(CycleOutcome::Unchanged { .. }))));
        assert!(!seen.iter().any(|m| matches!(m, PollProgress::Render { .. })));
    }

    #[test]
    fn test_manager_keeps_polling_after_failure() {
        let mut manager = PollManager::new();
        manager.start_polling(
            SharedSource::new(vec![Err(500), Ok("back")]),
            settings(),
            String::new(),
        );
        let seen = collect_until(&manager, Duration::from_secs(5), |m| {
            matches!(m, PollProgress::Render { .. })
        });
        assert!(seen.iter().any(|m| matches!(
            m,
            PollProgress::Outcome(CycleOutcome::FetchFailed { .. })
        )));
        assert!(seen.iter().any(|m| matches!(m, PollProgress::Render { .. })));
    }

    fn run_slow_source(max_in_flight: usize) -> SlowSource {
        let source = SlowSource::new(Duration::from_millis(150));
        let mut manager = PollManager::new();
        manager.start_polling(
            source.clone(),
            PollSettings {
                interval: Duration::from_millis(10),
                compare: ComparisonMode::Exact,
                max_in_flight,
            },
            String::new(),
        );
        std::thread::sleep(Duration::from_millis(600));
        manager.stop_polling();
        // Let any worker that is mid-fetch finish before counters are read.
        std::thread::sleep(Duration::from_millis(300));
        source
    }

    #[test]
    fn test_max_in_flight_one_serialises_fetches() {
        let source = run_slow_source(1);
        assert_eq!(source.max_active.load(Ordering::SeqCst), 1);
        // Ticks keep coming while a fetch is running; polling continues after
        // each completes instead of stalling.
        assert!(source.calls.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_max_in_flight_bounds_overlapping_fetches() {
        let source = run_slow_source(2);
        let max_active = source.max_active.load(Ordering::SeqCst);
        assert!(max_active <= 2, "{max_active} fetches overlapped");
        assert!(max_active >= 1);
    }
}
