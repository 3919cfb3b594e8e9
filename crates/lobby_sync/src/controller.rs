//! The session controller collaborators drive.
//!
//! [`SessionController`] is the sole entry point for every session effect:
//! create, join, leave, member removal, readiness, and the per-tick sync.
//! It owns the [`SessionLifecycleState`] and applies every registry response
//! to it.
//!
//! ## Reconciliation
//!
//! A fetched snapshot (poll or ready toggle) is diffed against the active
//! roster. Unchanged rosters are discarded. A changed roster replaces the
//! snapshot and then either raises [`SessionEvent::Changed`] or, when the
//! local member is missing, [`SessionEvent::NotInSession`] with
//! [`ExitReason::MemberRemoved`].
//!
//! ## Errors
//!
//! Caller-initiated joins surface `NotFound` / `Full`. Background poll and
//! heartbeat failures map `NotFound` to [`ExitReason::SessionClosed`] and
//! `Forbidden` to [`ExitReason::MemberRemoved`]; anything else is logged and
//! retried on a later tick.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use lobby_model::{
    Attributes, CONNECTION_TOKEN_KEY, HOST_NAME_KEY, Member, MemberId, Session, SessionId, changed,
    member_attributes,
};
use lobby_net::{CreateSessionRequest, JoinOptions, RegistryError, SessionFilter, SessionRegistry};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SessionError;
use crate::events::{EventBus, ExitReason, SessionEvent, Subscription, SubscriptionId};
use crate::scheduler::{ListRefreshTimer, SyncAction, SyncScheduler};
use crate::state::{Role, SessionLifecycleState};

/// Marks a controller as torn down from outside its own call stack.
///
/// Once torn down, registry responses still in flight are discarded instead
/// of applied, [`SessionController::tick`] does nothing, and create/join
/// return [`SessionError::TornDown`].
#[derive(Debug, Clone, Default)]
pub struct TeardownHandle(Arc<AtomicBool>);

impl TeardownHandle {
    pub fn tear_down(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Keeps the local session view in step with the registry.
pub struct SessionController {
    registry: Arc<dyn SessionRegistry>,
    local_member_id: MemberId,
    config: SyncConfig,
    state: SessionLifecycleState,
    scheduler: SyncScheduler,
    list_timer: ListRefreshTimer,
    sessions: Vec<Session>,
    events: EventBus,
    teardown: TeardownHandle,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("local_member_id", &self.local_member_id)
            .field("state", &self.state)
            .field("sessions", &self.sessions.len())
            .field("subscribers", &self.events.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create a controller acting as `local_member_id`, which must be the
    /// identity the registry client authenticates as.
    #[must_use]
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        local_member_id: MemberId,
        config: SyncConfig,
    ) -> Self {
        Self {
            registry,
            local_member_id,
            scheduler: SyncScheduler::from_config(&config),
            list_timer: ListRefreshTimer::new(config.list_refresh_interval),
            events: EventBus::new(config.event_capacity),
            config,
            state: SessionLifecycleState::new(),
            sessions: Vec::new(),
            teardown: TeardownHandle::default(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> &SessionLifecycleState {
        &self.state
    }

    #[must_use]
    pub fn local_member_id(&self) -> &MemberId {
        &self.local_member_id
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        self.state.active_session()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.state.role()
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.state.role() == Role::Host
    }

    /// The active roster, empty outside a session.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        self.state
            .active_session()
            .map(|session| session.members.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members().len()
    }

    #[must_use]
    pub fn member_id(&self, index: usize) -> Option<&MemberId> {
        self.members().get(index).map(|m| &m.id)
    }

    #[must_use]
    pub fn member_name(&self, index: usize) -> Option<&str> {
        self.members().get(index).and_then(Member::display_name)
    }

    /// Readiness verdict for the active snapshot.
    #[must_use]
    pub fn is_session_ready(&self) -> bool {
        self.state
            .active_session()
            .is_some_and(|session| self.config.readiness.is_ready(session))
    }

    /// The last successfully fetched session list.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    // ── Subscriptions & teardown ────────────────────────────────────────────

    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    #[must_use]
    pub fn teardown_handle(&self) -> TeardownHandle {
        self.teardown.clone()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_torn_down()
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.is_torn_down() {
            return Err(SessionError::TornDown);
        }
        Ok(())
    }

    // ── Operations ──────────────────────────────────────────────────────────

    /// Host a new session.
    ///
    /// Any session this member is already in is left first: a hosted one is
    /// deleted, a joined one is left. Failures there are logged only.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Registry`] if the create call fails and
    /// [`SessionError::TornDown`] if the controller was torn down meanwhile.
    pub async fn create(
        &mut self,
        name: &str,
        max_members: u32,
        host_name: &str,
        is_private: bool,
        connection_token: &str,
    ) -> Result<Session, SessionError> {
        info!(session_name = name, max_members, host_name, is_private, "creating session");
        self.ensure_alive()?;

        self.depart().await?;

        self.state.begin(host_name);
        let mut attributes = Attributes::new();
        attributes.insert(HOST_NAME_KEY.to_string(), host_name.to_string());
        attributes.insert(CONNECTION_TOKEN_KEY.to_string(), connection_token.to_string());
        let request = CreateSessionRequest {
            name: name.to_string(),
            max_members,
            is_private,
            attributes,
            member_attributes: self.local_attributes(),
        };

        let result = self.registry.create_session(request).await;
        self.ensure_alive()?;

        match result {
            Ok(session) => {
                info!(%session, "session created");
                self.state.install(session.clone(), Role::Host);
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, session_name = name, "failed to create session");
                Err(e.into())
            }
        }
    }

    /// Join a session by id.
    ///
    /// Leaves the current session first. Failures other than `NotFound` and
    /// `Full` are logged and the current state (usually no session) is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] or [`SessionError::Full`] with the
    /// local state cleared, or [`SessionError::TornDown`].
    pub async fn join(
        &mut self,
        session_id: &SessionId,
        player_name: &str,
    ) -> Result<Option<Session>, SessionError> {
        info!(%session_id, player_name, "joining session");
        let options = self.prepare_to_join(player_name).await?;
        let result = self.registry.join_session_by_id(session_id, options).await;
        self.finish_join(result)
    }

    /// Join a session by its shareable code. Same contract as
    /// [`join`](Self::join).
    ///
    /// # Errors
    ///
    /// See [`join`](Self::join).
    pub async fn join_by_code(
        &mut self,
        join_code: &str,
        player_name: &str,
    ) -> Result<Option<Session>, SessionError> {
        info!(join_code, player_name, "joining session by code");
        let options = self.prepare_to_join(player_name).await?;
        let result = self.registry.join_session_by_code(join_code, options).await;
        self.finish_join(result)
    }

    async fn prepare_to_join(&mut self, player_name: &str) -> Result<JoinOptions, SessionError> {
        self.ensure_alive()?;
        self.depart().await?;
        self.state.begin(player_name);
        Ok(JoinOptions {
            member_attributes: self.local_attributes(),
        })
    }

    /// Exit the current session ahead of a create or join. The local view
    /// is dropped and `Left` raised even if the registry call failed.
    async fn depart(&mut self) -> Result<(), SessionError> {
        if self.state.active_session().is_none() {
            return Ok(());
        }
        info!("already in a session, leaving it first");
        self.exit().await;
        self.ensure_alive()?;
        self.exit_session(ExitReason::Left);
        Ok(())
    }

    fn finish_join(
        &mut self,
        result: Result<Session, RegistryError>,
    ) -> Result<Option<Session>, SessionError> {
        self.ensure_alive()?;
        match result {
            Ok(session) => {
                info!(%session, "joined session");
                self.state.install(session.clone(), Role::Client);
                Ok(Some(session))
            }
            Err(RegistryError::NotFound) => {
                info!("session to join was not found");
                self.state.clear();
                Err(SessionError::NotFound)
            }
            Err(RegistryError::Full) => {
                info!("session to join is full");
                self.state.clear();
                Err(SessionError::Full)
            }
            Err(e) => {
                warn!(error = %e, "failed to join session");
                Ok(self.state.active_session().cloned())
            }
        }
    }

    /// Leave the active session. Does nothing outside a session.
    pub async fn leave(&mut self) {
        let Some(session_id) = self.active_session_id() else {
            debug!("leave requested while not in a session");
            return;
        };
        info!(%session_id, "leaving session");

        let result = self
            .registry
            .remove_member(&session_id, &self.local_member_id)
            .await;
        if self.is_torn_down() {
            return;
        }
        if let Err(e) = result {
            warn!(error = %e, %session_id, "failed to remove local member");
        }
        self.exit_session(ExitReason::Left);
    }

    /// Delete the hosted session and notify listeners.
    pub async fn close(&mut self) {
        self.delete_hosted(true).await;
    }

    /// Delete the hosted session without notifying listeners.
    pub async fn close_silently(&mut self) {
        self.delete_hosted(false).await;
    }

    /// Leave the way the role requires: the host closes its session, a
    /// client leaves.
    pub async fn exit(&mut self) {
        match self.state.role() {
            Role::Host => self.close().await,
            Role::Client => self.leave().await,
        }
    }

    async fn delete_hosted(&mut self, notify: bool) {
        if !self.is_host() {
            return;
        }
        let Some(session_id) = self.active_session_id() else {
            return;
        };
        info!(%session_id, notify, "deleting hosted session");

        let result = self.registry.delete_session(&session_id).await;
        if self.is_torn_down() {
            return;
        }
        match result {
            Ok(()) | Err(RegistryError::NotFound) => {
                if notify {
                    self.exit_session(ExitReason::Left);
                } else {
                    self.state.clear();
                }
            }
            Err(e) => warn!(error = %e, %session_id, "failed to delete session"),
        }
    }

    /// Remove another member from the active session.
    ///
    /// Meant for hosts; callers gate it on [`is_host`](Self::is_host).
    pub async fn remove_member(&mut self, member_id: &MemberId) {
        let Some(session_id) = self.active_session_id() else {
            debug!(%member_id, "remove requested while not in a session");
            return;
        };
        info!(%session_id, %member_id, "removing member");

        if let Err(e) = self.registry.remove_member(&session_id, member_id).await {
            warn!(error = %e, %session_id, %member_id, "failed to remove member");
        }
    }

    /// Flip the local ready flag, publish it, and reconcile the returned
    /// snapshot.
    pub async fn toggle_ready(&mut self) {
        let Some(session_id) = self.active_session_id() else {
            info!("cannot toggle ready state outside a session");
            return;
        };
        let ready = self.state.toggle_ready();
        debug!(%session_id, ready, "publishing ready state");

        let result = self
            .registry
            .update_member(&session_id, &self.local_member_id, self.local_attributes())
            .await;
        if self.is_torn_down() {
            return;
        }
        match result {
            Ok(session) => self.reconcile(session),
            Err(e) => warn!(error = %e, %session_id, "failed to publish ready state"),
        }
    }

    /// The game has started.
    ///
    /// A host stops heartbeats and polls but keeps its session; it deletes it
    /// once every member acknowledged the start. A client drops the session
    /// right away without notifying listeners.
    pub fn on_game_started(&mut self) {
        info!(role = ?self.state.role(), "game started");
        match self.state.role() {
            Role::Host => self.state.mark_game_started(),
            Role::Client => {
                self.state.clear();
            }
        }
    }

    // ── Per-tick sync ───────────────────────────────────────────────────────

    /// Run one sync step. Issues at most one registry call and returns which
    /// one, if any.
    pub async fn tick(&mut self, now: Instant) -> Option<SyncAction> {
        if self.is_torn_down() {
            return None;
        }
        let action = self.scheduler.next_action(&mut self.state, now)?;
        let session_id = self.active_session_id()?;

        match action {
            SyncAction::Heartbeat => {
                debug!(%session_id, "sending heartbeat");
                let result = self.registry.heartbeat(&session_id).await;
                if self.is_torn_down() {
                    return Some(action);
                }
                if let Err(e) = result {
                    self.handle_sync_error(e);
                }
            }
            SyncAction::Poll => {
                debug!(%session_id, "polling session");
                let result = self.registry.query_session(&session_id).await;
                if self.is_torn_down() {
                    return Some(action);
                }
                match result {
                    Ok(session) => self.reconcile(session),
                    Err(e) => self.handle_sync_error(e),
                }
            }
        }
        Some(action)
    }

    fn handle_sync_error(&mut self, error: RegistryError) {
        match error {
            RegistryError::NotFound => {
                info!("session no longer exists");
                self.exit_session(ExitReason::SessionClosed);
            }
            RegistryError::Forbidden => {
                info!("session no longer visible, local member was removed");
                self.exit_session(ExitReason::MemberRemoved);
            }
            other => warn!(error = %other, "session sync call failed, retrying on a later tick"),
        }
    }

    fn reconcile(&mut self, updated: Session) {
        let Some(current) = self.state.active_session() else {
            debug!("discarding snapshot, no active session");
            return;
        };
        if current.id != updated.id {
            debug!(current = %current.id, fetched = %updated.id, "discarding snapshot of another session");
            return;
        }
        if !changed(&current.members, &updated.members) {
            return;
        }

        let present = updated.contains_member(&self.local_member_id);
        self.state.replace(updated.clone());

        if present {
            let is_ready = self.config.readiness.is_ready(&updated);
            info!(session = %updated, is_ready, "session changed");
            self.events.publish(SessionEvent::Changed {
                session: updated,
                is_ready,
            });
        } else {
            info!(session_id = %updated.id, "local member missing from roster, removed by host");
            self.exit_session(ExitReason::MemberRemoved);
        }
    }

    /// Clear the session and raise `NotInSession`, at most once per session.
    fn exit_session(&mut self, reason: ExitReason) {
        if self.state.clear().is_some() {
            self.events.publish(SessionEvent::NotInSession { reason });
        }
    }

    // ── Session browsing ────────────────────────────────────────────────────

    /// Fetch the session list. On failure the previous list is kept.
    pub async fn refresh_session_list(&mut self, filter: &SessionFilter) -> &[Session] {
        match self.registry.list_sessions(filter).await {
            Ok(sessions) if !self.is_torn_down() => {
                debug!(count = sessions.len(), "session list refreshed");
                self.sessions = sessions;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to refresh session list"),
        }
        &self.sessions
    }

    /// Start refreshing the session list on [`browse_tick`](Self::browse_tick).
    pub fn start_browsing(&mut self, now: Instant) {
        self.list_timer.start(now);
    }

    pub fn stop_browsing(&mut self) {
        self.list_timer.stop();
    }

    /// Refresh the session list if due. Returns `true` if a refresh ran.
    pub async fn browse_tick(&mut self, now: Instant, filter: &SessionFilter) -> bool {
        if self.is_torn_down() || !self.list_timer.take_due(now) {
            return false;
        }
        self.refresh_session_list(filter).await;
        self.list_timer.rearm(now);
        true
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    fn active_session_id(&self) -> Option<SessionId> {
        self.state.active_session().map(|s| s.id.clone())
    }

    fn local_attributes(&self) -> Attributes {
        member_attributes(self.state.local_player_name(), self.state.local_ready())
    }
}
