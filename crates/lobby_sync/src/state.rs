//! Local session lifecycle state.
//!
//! [`SessionLifecycleState`] owns the active session snapshot. The snapshot
//! is installed by a create or join, replaced wholesale by later registry
//! responses, and cleared on leave, delete, or a lifecycle error.

use std::time::Instant;

use lobby_model::Session;
use serde::Serialize;

/// The local member's role in the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Owns the session lifecycle: heartbeats and deletion.
    Host,
    /// Any other member.
    Client,
}

/// Snapshot, role and readiness flags of the local participant.
#[derive(Debug)]
pub struct SessionLifecycleState {
    active_session: Option<Session>,
    role: Role,
    local_ready: bool,
    game_started: bool,
    local_player_name: String,
    /// `None` means due on the next tick.
    pub(crate) next_heartbeat: Option<Instant>,
    /// `None` means due on the next tick.
    pub(crate) next_poll: Option<Instant>,
}

impl SessionLifecycleState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active_session: None,
            role: Role::Client,
            local_ready: false,
            game_started: false,
            local_player_name: String::new(),
            next_heartbeat: None,
            next_poll: None,
        }
    }

    /// Reset readiness and game flags ahead of a create or join.
    pub fn begin(&mut self, player_name: &str) {
        self.local_ready = false;
        self.game_started = false;
        self.local_player_name = player_name.to_string();
    }

    /// Install a freshly created or joined session together with the role.
    ///
    /// Both scheduled calls become due immediately.
    pub fn install(&mut self, session: Session, role: Role) {
        self.active_session = Some(session);
        self.role = role;
        self.next_heartbeat = None;
        self.next_poll = None;
    }

    /// Replace the active snapshot with a newer one from the registry.
    pub fn replace(&mut self, session: Session) {
        self.active_session = Some(session);
    }

    /// Drop the active session, returning it if there was one. The role
    /// falls back to [`Role::Client`].
    pub fn clear(&mut self) -> Option<Session> {
        self.role = Role::Client;
        self.active_session.take()
    }

    /// Flip the local ready flag and return the new value.
    pub fn toggle_ready(&mut self) -> bool {
        self.local_ready = !self.local_ready;
        self.local_ready
    }

    /// Stop all scheduled calls for the rest of this session.
    pub fn mark_game_started(&mut self) {
        self.game_started = true;
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        self.active_session.as_ref()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn local_ready(&self) -> bool {
        self.local_ready
    }

    #[must_use]
    pub fn game_started(&self) -> bool {
        self.game_started
    }

    #[must_use]
    pub fn local_player_name(&self) -> &str {
        &self.local_player_name
    }
}

impl Default for SessionLifecycleState {
    fn default() -> Self {
        Self::new()
    }
}
