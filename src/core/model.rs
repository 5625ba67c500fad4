// LogPoller - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::error::{FetchError, RenderError};
use chrono::{DateTime, Local};
use std::fmt;

// =============================================================================
// Snapshot
// =============================================================================

/// The full current representation of a log as returned by the endpoint.
///
/// Opaque: the poller never parses it, it only compares and replaces.
/// A snapshot lives for exactly one tick and is dropped after the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    body: String,
}

impl LogSnapshot {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Size of the body in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

// =============================================================================
// Request identity
// =============================================================================

/// Monotonically increasing tag attached to every fetch.
///
/// Responses are applied only when their id is newer than the last applied
/// one, so a slow early response can never overwrite a newer render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Comparison mode
// =============================================================================

/// How a fetched snapshot is compared against the displayed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonMode {
    /// Raw markup must match byte for byte.
    #[default]
    Exact,
    /// Tags are stripped and entities decoded before comparing, so a change
    /// that only touches markup does not trigger a re-render.
    TextContent,
}

impl ComparisonMode {
    pub fn all() -> &'static [ComparisonMode] {
        &[ComparisonMode::Exact, ComparisonMode::TextContent]
    }

    /// Value used in config.toml and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            ComparisonMode::Exact => "exact",
            ComparisonMode::TextContent => "text",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ComparisonMode::Exact => "Exact markup",
            ComparisonMode::TextContent => "Text content only",
        }
    }

    /// Parse a config/CLI key (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "exact" | "markup" => Some(ComparisonMode::Exact),
            "text" | "text-content" => Some(ComparisonMode::TextContent),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Cycle outcome
// =============================================================================

/// Result of one fetch-compare-render cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The snapshot differed and replaced the region's content.
    Rendered { request: RequestId, bytes: usize },

    /// The snapshot matched the displayed content; nothing was touched.
    Unchanged { request: RequestId },

    /// The response was older than one already applied, or arrived after
    /// the poller was stopped.
    Discarded {
        request: RequestId,
        latest: Option<RequestId>,
    },

    /// The fetch failed; the region was left unchanged.
    FetchFailed {
        request: RequestId,
        error: FetchError,
    },

    /// The region could not be read or written; the tick was abandoned.
    RenderFailed {
        request: RequestId,
        error: RenderError,
    },
}

impl CycleOutcome {
    pub fn request(&self) -> RequestId {
        match self {
            Self::Rendered { request, .. }
            | Self::Unchanged { request }
            | Self::Discarded { request, .. }
            | Self::FetchFailed { request, .. }
            | Self::RenderFailed { request, .. } => *request,
        }
    }

    /// True if the cycle replaced the region's content.
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

// =============================================================================
// Feed status (user-visible health of the log feed)
// =============================================================================

/// User-visible health of the feed. `Unavailable` is shown distinctly so a
/// failing endpoint is never mistaken for a quiet log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// No cycle has completed yet.
    #[default]
    Waiting,

    /// The last cycle succeeded.
    Live {
        /// When the displayed content last changed.
        last_change: Option<DateTime<Local>>,
        /// When the endpoint last answered successfully.
        last_check: DateTime<Local>,
    },

    /// The last cycle failed.
    Unavailable {
        reason: String,
        /// When the current run of failures began.
        since: DateTime<Local>,
        consecutive_failures: u32,
    },
}

impl FeedStatus {
    /// Status after `outcome` completed at `now`.
    pub fn advance(&self, outcome: &CycleOutcome, now: DateTime<Local>) -> FeedStatus {
        let last_change = match self {
            FeedStatus::Live { last_change, .. } => *last_change,
            _ => None,
        };
        match outcome {
            CycleOutcome::Rendered { .. } => FeedStatus::Live {
                last_change: Some(now),
                last_check: now,
            },
            CycleOutcome::Unchanged { .. } => FeedStatus::Live {
                last_change,
                last_check: now,
            },
            CycleOutcome::Discarded { .. } => self.clone(),
            CycleOutcome::FetchFailed { error, .. } => self.failed(error.label(), now),
            CycleOutcome::RenderFailed { error, .. } => {
                self.failed(format!("display error: {error}"), now)
            }
        }
    }

    fn failed(&self, reason: String, now: DateTime<Local>) -> FeedStatus {
        match self {
            FeedStatus::Unavailable {
                since,
                consecutive_failures,
                ..
            } => FeedStatus::Unavailable {
                reason,
                since: *since,
                consecutive_failures: consecutive_failures.saturating_add(1),
            },
            _ => FeedStatus::Unavailable {
                reason,
                since: now,
                consecutive_failures: 1,
            },
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FeedStatus::Unavailable { .. })
    }
}

// =============================================================================
// Poll Progress (for UI updates)
// =============================================================================

/// Messages sent from the poll thread to the UI thread.
#[derive(Debug, Clone)]
pub enum PollProgress {
    /// The poll thread is running.
    Started { endpoint: String, interval_ms: u64 },

    /// Replace the displayed content with `markup`.
    Render { markup: String },

    /// A cycle finished (any outcome, including `Rendered`).
    Outcome(CycleOutcome),

    /// The poll thread has exited.
    Stopped,
}
