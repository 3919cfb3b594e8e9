//! Sync configuration.

use std::time::Duration;

use lobby_model::ReadinessPolicy;

/// How often the host keeps its session alive. The registry rate-limits
/// heartbeats, so keep this long.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How often the session snapshot is re-read. Lower values hit the
/// registry's rate limit.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// How often the session list is refreshed while browsing.
pub const DEFAULT_LIST_REFRESH_INTERVAL: Duration = Duration::from_millis(1500);

/// Default capacity of each subscriber's event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration for a [`SessionController`](crate::SessionController).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minimum time between two host heartbeats.
    pub heartbeat_interval: Duration,
    /// Minimum time between two session polls.
    pub poll_interval: Duration,
    /// Minimum time between two session list refreshes.
    pub list_refresh_interval: Duration,
    /// When a session counts as ready to start.
    pub readiness: ReadinessPolicy,
    /// Capacity of each subscriber's event channel. A subscriber that falls
    /// this far behind loses `Changed` events; the latest `NotInSession` is
    /// kept and delivered after the queued ones.
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            list_refresh_interval: DEFAULT_LIST_REFRESH_INTERVAL,
            readiness: ReadinessPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_list_refresh_interval(mut self, interval: Duration) -> Self {
        self.list_refresh_interval = interval;
        self
    }

    /// Override the minimum member count for readiness.
    #[must_use]
    pub fn with_min_members(mut self, min_members: usize) -> Self {
        self.readiness = ReadinessPolicy::new(min_members);
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
