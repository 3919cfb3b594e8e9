//! Request payloads and the reply envelope for registry calls.
//!
//! Every request travels on its own subject (see [`crate::subjects`]) and is
//! answered with a [`RegistryReply`]. The caller's identity rides in the
//! [`headers::MEMBER_ID`] header, not in the payload.

use lobby_model::{Attributes, MemberId, SessionId};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// ── Requests ────────────────────────────────────────────────────────────────

/// Create a new session with the caller as host and first member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Display name of the session.
    pub name: String,
    /// Capacity, host included.
    pub max_members: u32,
    /// Hide from [`LIST`](crate::subjects::LIST) results.
    pub is_private: bool,
    /// Public session attributes.
    pub attributes: Attributes,
    /// Public attributes of the host's member record.
    pub member_attributes: Attributes,
}

/// Join an existing session by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinByIdRequest {
    pub session_id: SessionId,
    pub member_attributes: Attributes,
}

/// Join an existing session by its shareable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinByCodeRequest {
    pub join_code: String,
    pub member_attributes: Attributes,
}

/// Addresses a whole session (query, heartbeat, delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub session_id: SessionId,
}

/// Replace the public attributes of one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub session_id: SessionId,
    pub member_id: MemberId,
    pub attributes: Attributes,
}

/// Remove one member from a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMemberRequest {
    pub session_id: SessionId,
    pub member_id: MemberId,
}

/// Narrows a session listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFilter {
    /// Only sessions whose name contains this text.
    pub name_contains: Option<String>,
    /// Skip sessions that are already full.
    pub only_open: bool,
    /// Upper bound on the number of results.
    pub limit: Option<u32>,
}

impl SessionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.name_contains = Some(text.into());
        self
    }

    #[must_use]
    pub fn only_open(mut self) -> Self {
        self.only_open = true;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ── Replies ─────────────────────────────────────────────────────────────────

/// Why the registry refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorReason {
    NotFound,
    Full,
    Forbidden,
    RateLimited,
    Other,
}

/// Error half of a [`RegistryReply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub reason: ErrorReason,
    pub message: String,
}

impl ErrorReply {
    #[must_use]
    pub fn new(reason: ErrorReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Envelope for every registry answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryReply<T> {
    Ok(T),
    Err(ErrorReply),
}

impl<T> RegistryReply<T> {
    /// Convert the envelope into a `Result`, mapping the error reason onto
    /// [`RegistryError`].
    ///
    /// # Errors
    ///
    /// Returns the [`RegistryError`] matching the reply's reason.
    pub fn into_result(self) -> Result<T, RegistryError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(reply) => Err(reply.into()),
        }
    }
}

// ── NATS header keys ────────────────────────────────────────────────────────

/// NATS header keys used for caller metadata.
pub mod headers {
    /// The identity of the calling member.
    pub const MEMBER_ID: &str = "member-id";
}
