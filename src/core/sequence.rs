// LogPoller - core/sequence.rs
//
// Request sequencing. Every fetch is tagged with a monotonically increasing
// RequestId. A response is accepted only if it is newer than the last
// snapshot applied to the display and was issued after the most recent
// cancellation, so overlapping requests that complete out of order can never
// roll the display back. A failed fetch applies nothing and so never
// supersedes an older request that is still in flight.

use crate::core::model::RequestId;
use std::collections::BTreeSet;

/// Logical poller state derived from outstanding requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No request in flight.
    Idle,
    /// At least one request in flight; `current` is the newest.
    Fetching { current: RequestId },
}

/// Verdict for a completed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Newest response so far; apply it.
    Fresh,
    /// Superseded or cancelled; drop it. `latest` is the last applied id.
    Stale { latest: Option<RequestId> },
}

/// Issues request ids and decides which responses may be applied.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    /// Newest issued request that has not completed yet.
    current: Option<RequestId>,
    outstanding: BTreeSet<RequestId>,
    last_applied: Option<RequestId>,
    /// Requests with an id below this were cancelled.
    floor: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new request.
    pub fn issue(&mut self) -> RequestId {
        self.next += 1;
        let id = RequestId::new(self.next);
        self.outstanding.insert(id);
        self.current = Some(id);
        id
    }

    /// Record the completion of `id` and decide whether it may be applied.
    ///
    /// Every completion frees its in-flight slot. Only `mark_applied` moves
    /// the last-applied mark.
    pub fn complete(&mut self, id: RequestId) -> Acceptance {
        self.outstanding.remove(&id);
        self.current = self.outstanding.iter().next_back().copied();

        let cancelled = id.value() < self.floor;
        let superseded = self.last_applied.is_some_and(|last| id <= last);
        if cancelled || superseded {
            return Acceptance::Stale {
                latest: self.last_applied,
            };
        }
        Acceptance::Fresh
    }

    /// Record that the snapshot fetched by `id` is now what the display
    /// shows (rendered, or already identical).
    pub fn mark_applied(&mut self, id: RequestId) {
        if self.last_applied.map_or(true, |last| id > last) {
            self.last_applied = Some(id);
        }
    }

    /// Cancel every outstanding request: their responses will be stale.
    pub fn cancel_outstanding(&mut self) {
        self.floor = self.next + 1;
        self.outstanding.clear();
        self.current = None;
    }

    /// Newest in-flight request, if any.
    pub fn current(&self) -> Option<RequestId> {
        self.current
    }

    pub fn in_flight(&self) -> usize {
        self.outstanding.len()
    }

    pub fn last_applied(&self) -> Option<RequestId> {
        self.last_applied
    }

    pub fn state(&self) -> PollerState {
        match self.current {
            Some(current) => PollerState::Fetching { current },
            None => PollerState::Idle,
        }
    }
}
