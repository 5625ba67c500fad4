// LogPoller - app/headless.rs
//
// Terminal mode: the display region is a writer (stdout in practice).
// Fetches are serialised on the calling thread; each changed snapshot is
// printed in full under a timestamped header. Diagnostics go through tracing
// (stderr), so stdout carries only log content.

use crate::app::fetch::SnapshotSource;
use crate::app::poller::{LogPoller, PollSettings};
use crate::core::markup;
use crate::core::model::{CycleOutcome, FeedStatus};
use crate::core::region::DisplayRegion;
use crate::core::schedule::SystemClock;
use crate::util::error::{self, RenderError};
use std::io::Write;
use std::time::Duration;

/// Display region that prints each replacement to a writer.
pub struct TerminalRegion<W: Write> {
    out: W,
    displayed: String,
}

impl<W: Write> TerminalRegion<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            displayed: String::new(),
        }
    }

    fn write_snapshot(&mut self, markup: &str) -> std::io::Result<()> {
        let lines = markup::render_lines(markup);
        writeln!(
            self.out,
            "==== {} | {} line(s) ====",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            lines.len()
        )?;
        for line in &lines {
            writeln!(self.out, "{}", line.text)?;
        }
        self.out.flush()
    }
}

impl<W: Write> DisplayRegion for TerminalRegion<W> {
    fn content(&self) -> Result<&str, RenderError> {
        Ok(&self.displayed)
    }

    fn replace(&mut self, markup: &str) -> Result<(), RenderError> {
        self.write_snapshot(markup).map_err(|e| {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                RenderError::Detached {
                    region: "terminal".to_string(),
                }
            } else {
                RenderError::Write {
                    region: "terminal".to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        self.displayed.clear();
        self.displayed.push_str(markup);
        Ok(())
    }
}

/// How long headless mode runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessOptions {
    /// Stop after this many cycles (`None` = run until killed).
    pub max_cycles: Option<u64>,
    /// Return the first fetch or render error instead of continuing.
    pub fail_fast: bool,
}

/// Counters reported when headless mode returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub cycles: u64,
    pub renders: u64,
    pub failures: u64,
}

/// Poll `source` and print changes to `out`.
pub fn run_headless<S, W>(
    source: S,
    settings: PollSettings,
    out: W,
    options: HeadlessOptions,
) -> error::Result<HeadlessSummary>
where
    S: SnapshotSource,
    W: Write,
{
    let mut region = TerminalRegion::new(out);
    let mut poller = LogPoller::new(source, SystemClock::new(), settings);
    let mut summary = HeadlessSummary::default();
    let mut status = FeedStatus::default();

    poller.start();
    while options.max_cycles.map_or(true, |max| summary.cycles < max) {
        let Some(outcome) = poller.run_due(&mut region) else {
            let wait = poller
                .time_until_next_tick()
                .unwrap_or(settings.interval);
            std::thread::sleep(wait.max(Duration::from_millis(1)));
            continue;
        };

        summary.cycles += 1;
        let next = status.advance(&outcome, chrono::Local::now());
        report_transition(&status, &next);
        status = next;

        match outcome {
            CycleOutcome::Rendered { .. } => summary.renders += 1,
            CycleOutcome::FetchFailed { error, .. } => {
                summary.failures += 1;
                if options.fail_fast {
                    return Err(error.into());
                }
            }
            CycleOutcome::RenderFailed { error, .. } => {
                summary.failures += 1;
                if options.fail_fast || matches!(error, RenderError::Detached { .. }) {
                    return Err(error.into());
                }
            }
            CycleOutcome::Unchanged { .. } | CycleOutcome::Discarded { .. } => {}
        }
    }

    poller.stop();
    Ok(summary)
}

/// Log feed health changes once per transition rather than once per tick.
fn report_transition(previous: &FeedStatus, next: &FeedStatus) {
    match (previous.is_unavailable(), next) {
        (false, FeedStatus::Unavailable { reason, .. }) => {
            tracing::warn!(reason = %reason, "Log unavailable");
        }
        (true, FeedStatus::Live { .. }) => {
            tracing::info!("Log feed recovered");
        }
        _ => {}
    }
}
