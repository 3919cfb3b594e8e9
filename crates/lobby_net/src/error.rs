//! Transport and registry error types.

use crate::messages::{ErrorReason, ErrorReply};

/// Errors that can occur while talking to NATS.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to MessagePack.
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a message from MessagePack.
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// NATS request/reply error (no responders, timeout, ...).
    #[error("NATS request error: {0}")]
    Request(#[from] async_nats::RequestError),
}

/// Failures reported by a [`SessionRegistry`](crate::SessionRegistry) call.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The session does not exist (closed by its host or expired).
    #[error("session not found")]
    NotFound,

    /// The session is at capacity.
    #[error("session is full")]
    Full,

    /// The caller may no longer see the session, typically because the host
    /// removed it.
    #[error("access to session forbidden")]
    Forbidden,

    /// The registry throttled the caller.
    #[error("rate limited by registry")]
    RateLimited,

    /// Any other refusal from the registry.
    #[error("registry rejected request: {0}")]
    Rejected(String),

    /// The request never got a registry answer.
    #[error(transparent)]
    Transport(#[from] NetError),
}

impl From<ErrorReply> for RegistryError {
    fn from(reply: ErrorReply) -> Self {
        match reply.reason {
            ErrorReason::NotFound => Self::NotFound,
            ErrorReason::Full => Self::Full,
            ErrorReason::Forbidden => Self::Forbidden,
            ErrorReason::RateLimited => Self::RateLimited,
            ErrorReason::Other => Self::Rejected(reply.message),
        }
    }
}
