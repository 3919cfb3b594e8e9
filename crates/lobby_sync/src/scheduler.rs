//! Per-tick scheduling of registry calls.
//!
//! Two independent deadlines drive the session sync: the host heartbeat and
//! the snapshot poll. Each tick yields at most one [`SyncAction`]. A due
//! heartbeat wins and starves the poll check for that tick, so two calls
//! never race on the shared snapshot. A deadline is always advanced before
//! the call is issued; a stalled or failing call cannot cause a burst of
//! retries against the rate-limited registry.

use std::time::{Duration, Instant};

use crate::config::SyncConfig;
use crate::state::{Role, SessionLifecycleState};

/// The registry call a tick should issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Keep the hosted session alive.
    Heartbeat,
    /// Re-read the session snapshot.
    Poll,
}

/// Decides, each tick, whether a heartbeat, a poll, or nothing is due.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    heartbeat_interval: Duration,
    poll_interval: Duration,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(heartbeat_interval: Duration, poll_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            poll_interval,
        }
    }

    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.heartbeat_interval, config.poll_interval)
    }

    /// Returns the action due at `now`, advancing its deadline.
    ///
    /// Yields nothing while no session is active or once the game started.
    pub fn next_action(
        &self,
        state: &mut SessionLifecycleState,
        now: Instant,
    ) -> Option<SyncAction> {
        if state.active_session().is_none() || state.game_started() {
            return None;
        }

        if state.role() == Role::Host && is_due(state.next_heartbeat, now) {
            state.next_heartbeat = Some(now + self.heartbeat_interval);
            return Some(SyncAction::Heartbeat);
        }

        if is_due(state.next_poll, now) {
            state.next_poll = Some(now + self.poll_interval);
            return Some(SyncAction::Poll);
        }

        None
    }
}

fn is_due(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.is_none_or(|at| now >= at)
}

/// Deadline for refreshing the session list while browsing.
///
/// The timer disarms itself when it fires and is re-armed once the refresh
/// has completed, so a slow list call never overlaps the next one.
#[derive(Debug, Clone)]
pub struct ListRefreshTimer {
    interval: Duration,
    next: Option<Instant>,
}

impl ListRefreshTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    /// Make a refresh due right away.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    /// Returns `true` and disarms the timer if a refresh is due.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.next.is_some_and(|at| now >= at) {
            self.next = None;
            return true;
        }
        false
    }

    /// Schedule the next refresh one interval after `now`.
    pub fn rearm(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }
}
