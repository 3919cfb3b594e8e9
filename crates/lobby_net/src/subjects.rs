//! Registry subject hierarchy.
//!
//! Every registry operation is a request/reply subject under a shared
//! prefix, `<prefix>.<operation>`. The prefix defaults to
//! [`DEFAULT_PREFIX`] and is configurable so several registries can share a
//! NATS cluster.

/// Default prefix for registry subjects.
pub const DEFAULT_PREFIX: &str = "lobby.registry";

// ── Operations ──────────────────────────────────────────────────────────────

/// Create a session. Payload: [`CreateSessionRequest`](crate::messages::CreateSessionRequest).
pub const CREATE: &str = "create";

/// Join a session by id.
pub const JOIN_BY_ID: &str = "join.id";

/// Join a session by its shareable code.
pub const JOIN_BY_CODE: &str = "join.code";

/// Fetch the current snapshot of one session.
pub const QUERY: &str = "query";

/// Replace a member's public attributes.
pub const UPDATE_MEMBER: &str = "member.update";

/// Remove a member from a session.
pub const REMOVE_MEMBER: &str = "member.remove";

/// Keep a session from expiring. Host only.
pub const HEARTBEAT: &str = "heartbeat";

/// Delete a session. Host only.
pub const DELETE: &str = "delete";

/// List discoverable sessions.
pub const LIST: &str = "list";

// ── Subject builder ─────────────────────────────────────────────────────────

/// Build the subject for an operation under `prefix`.
///
/// `<prefix>.<operation>`
#[must_use]
pub fn operation(prefix: &str, operation: &str) -> String {
    format!("{prefix}.{operation}")
}
