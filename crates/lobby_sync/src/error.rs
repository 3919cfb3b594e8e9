//! Errors surfaced to callers of [`SessionController`](crate::SessionController)
//! operations.
//!
//! Only intents a caller is synchronously waiting on produce errors.
//! Background poll and heartbeat failures never surface here; they become
//! [`SessionEvent::NotInSession`](crate::SessionEvent::NotInSession)
//! notifications or are logged and retried on a later tick.

use lobby_net::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session to join does not exist.
    #[error("session not found")]
    NotFound,

    /// The session to join is at capacity.
    #[error("session is full")]
    Full,

    /// The controller was torn down while the operation was in flight.
    #[error("session controller was torn down")]
    TornDown,

    /// Any other registry failure on a caller-initiated operation.
    #[error("registry call failed: {0}")]
    Registry(#[from] RegistryError),
}
