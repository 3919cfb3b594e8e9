//! Fixed-rate driver for a [`SessionController`].
//!
//! Each tick:
//!
//! 1. Run one controller sync step (heartbeat or poll, at most one call).
//! 2. Drain the event subscription and report every event.
//! 3. Stop on leaving the session, on game start, on the tick limit, or when
//!    the shutdown signal fires.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use lobby_sync::{ExitReason, SessionController, SessionEvent, Subscription};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::output::Output;

/// Configuration for the driver tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// Wall-clock length of one tick. Non-positive rates fall back to one
    /// tick per second.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        if self.tick_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.tick_rate)
        } else {
            Duration::from_secs(1)
        }
    }
}

/// Why the tick loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The configured tick limit was reached.
    Finished,
    /// The local member is no longer in a session.
    Exited(ExitReason),
    /// The host saw a ready session, started the game and closed the session.
    Started,
    /// The shutdown signal fired; the session was exited.
    Interrupted,
}

pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    controller: SessionController,
    events: Subscription,
    output: Output,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, mut controller: SessionController, output: Output) -> Self {
        let events = controller.subscribe();
        Self {
            tick_id: 0,
            config,
            controller,
            events,
            output,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SessionController {
        &mut self.controller
    }

    /// Run until the session ends, the tick limit is hit, or `shutdown`
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns an error if an event cannot be rendered.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) -> Result<LoopOutcome> {
        let mut interval = tokio::time::interval(self.config.tick_duration());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!(tick_id = self.tick_id, "shutdown requested, exiting session");
                    self.controller.exit().await;
                    return Ok(LoopOutcome::Interrupted);
                }
                _ = interval.tick() => {}
            }

            self.tick_id += 1;
            if let Some(action) = self.controller.tick(Instant::now()).await {
                debug!(tick_id = self.tick_id, ?action, "sync step");
            }

            if let Some(outcome) = self.drain_events().await? {
                info!(tick_id = self.tick_id, ?outcome, "tick loop complete");
                return Ok(outcome);
            }

            if self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks {
                info!(ticks = self.tick_id, "tick limit reached");
                return Ok(LoopOutcome::Finished);
            }
        }
    }

    async fn drain_events(&mut self) -> Result<Option<LoopOutcome>> {
        while let Some(event) = self.events.try_recv() {
            self.output.event(&event)?;
            match event {
                SessionEvent::NotInSession { reason } => {
                    return Ok(Some(LoopOutcome::Exited(reason)));
                }
                SessionEvent::Changed { is_ready: true, .. } if self.controller.is_host() => {
                    info!("every member is ready, starting the game");
                    self.controller.on_game_started();
                    self.controller.close_silently().await;
                    return Ok(Some(LoopOutcome::Started));
                }
                SessionEvent::Changed { .. } => {}
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use lobby_model::{Attributes, Member, MemberId, Session, SessionId};
    use lobby_net::{
        CreateSessionRequest, JoinOptions, RegistryError, SessionFilter, SessionRegistry,
    };
    use lobby_sync::SyncConfig;

    use super::*;

    fn snapshot(members: Vec<Member>) -> Session {
        Session {
            id: SessionId::new("s-1"),
            name: "Alpha".to_string(),
            max_members: 2,
            is_private: false,
            join_code: None,
            host_id: MemberId::new("p1"),
            created_at_ms: 0,
            attributes: Attributes::new(),
            members,
        }
    }

    /// Answers create/join with `initial` and every poll with `polled`, or
    /// `NotFound` when `polled` is `None`.
    struct StubRegistry {
        initial: Session,
        polled: Option<Session>,
        deletes: AtomicUsize,
    }

    impl StubRegistry {
        fn new(initial: Session, polled: Option<Session>) -> Arc<Self> {
            Arc::new(Self {
                initial,
                polled,
                deletes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SessionRegistry for StubRegistry {
        async fn create_session(&self, _: CreateSessionRequest) -> Result<Session, RegistryError> {
            Ok(self.initial.clone())
        }

        async fn join_session_by_id(
            &self,
            _: &SessionId,
            _: JoinOptions,
        ) -> Result<Session, RegistryError> {
            Ok(self.initial.clone())
        }

        async fn join_session_by_code(
            &self,
            _: &str,
            _: JoinOptions,
        ) -> Result<Session, RegistryError> {
            Ok(self.initial.clone())
        }

        async fn query_session(&self, _: &SessionId) -> Result<Session, RegistryError> {
            self.polled.clone().ok_or(RegistryError::NotFound)
        }

        async fn update_member(
            &self,
            _: &SessionId,
            _: &MemberId,
            _: Attributes,
        ) -> Result<Session, RegistryError> {
            Ok(self.initial.clone())
        }

        async fn remove_member(&self, _: &SessionId, _: &MemberId) -> Result<(), RegistryError> {
            Ok(())
        }

        async fn heartbeat(&self, _: &SessionId) -> Result<(), RegistryError> {
            Ok(())
        }

        async fn delete_session(&self, _: &SessionId) -> Result<(), RegistryError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn list_sessions(&self, _: &SessionFilter) -> Result<Vec<Session>, RegistryError> {
            Ok(Vec::new())
        }
    }

    fn fast(max_ticks: u64) -> TickConfig {
        TickConfig {
            tick_rate: 1000.0,
            max_ticks,
        }
    }

    #[test]
    fn test_tick_duration() {
        assert_eq!(fast(0).tick_duration(), Duration::from_millis(1));
        let stalled = TickConfig {
            tick_rate: 0.0,
            max_ticks: 0,
        };
        assert_eq!(stalled.tick_duration(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_run_limited_ticks_without_session() {
        let registry = StubRegistry::new(snapshot(vec![]), None);
        let controller = SessionController::new(registry, MemberId::new("p1"), SyncConfig::default());
        let mut tick_loop = TickLoop::new(fast(5), controller, Output::Log);

        let outcome = tick_loop.run_until(pending()).await.unwrap();

        assert_eq!(outcome, LoopOutcome::Finished);
        assert_eq!(tick_loop.tick_id(), 5);
    }

    #[tokio::test]
    async fn test_closed_session_ends_loop() {
        let registry = StubRegistry::new(
            snapshot(vec![Member::new("p1", "Ada", false), Member::new("p2", "Bo", false)]),
            None,
        );
        let controller = SessionController::new(registry, MemberId::new("p2"), SyncConfig::default());
        let mut tick_loop = TickLoop::new(fast(100), controller, Output::Log);
        tick_loop
            .controller_mut()
            .join(&SessionId::new("s-1"), "Bo")
            .await
            .unwrap();

        let outcome = tick_loop.run_until(pending()).await.unwrap();

        assert_eq!(outcome, LoopOutcome::Exited(ExitReason::SessionClosed));
        assert_eq!(tick_loop.tick_id(), 1);
    }

    #[tokio::test]
    async fn test_host_starts_game_once_ready() {
        let registry = StubRegistry::new(
            snapshot(vec![Member::new("p1", "Ada", false)]),
            Some(snapshot(vec![Member::new("p1", "Ada", true), Member::new("p2", "Bo", true)])),
        );
        let controller =
            SessionController::new(registry.clone(), MemberId::new("p1"), SyncConfig::default());
        let mut tick_loop = TickLoop::new(fast(100), controller, Output::Log);
        tick_loop
            .controller_mut()
            .create("Alpha", 2, "Ada", false, "relay-1")
            .await
            .unwrap();

        let outcome = tick_loop.run_until(pending()).await.unwrap();

        assert_eq!(outcome, LoopOutcome::Started);
        assert_eq!(registry.deletes.load(Ordering::SeqCst), 1);
        assert!(tick_loop.controller().active_session().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_exits_hosted_session() {
        let registry = StubRegistry::new(snapshot(vec![Member::new("p1", "Ada", false)]), None);
        let controller =
            SessionController::new(registry.clone(), MemberId::new("p1"), SyncConfig::default());
        let mut tick_loop = TickLoop::new(fast(0), controller, Output::Log);
        tick_loop
            .controller_mut()
            .create("Alpha", 2, "Ada", false, "relay-1")
            .await
            .unwrap();

        let outcome = tick_loop.run_until(async {}).await.unwrap();

        assert_eq!(outcome, LoopOutcome::Interrupted);
        assert_eq!(registry.deletes.load(Ordering::SeqCst), 1);
    }
}
