//! # lobby_model
//!
//! The data model shared by every lobby crate.
//!
//! This crate provides:
//!
//! - [`Session`] — one registry record for a discoverable multiplayer lobby.
//! - [`Member`] — a participant entry, keyed by [`MemberId`].
//! - [`roster`] — roster diffing and the session readiness policy.

pub mod roster;
pub mod session;

pub use roster::{ReadinessPolicy, changed};
pub use session::{
    Attributes, CONNECTION_TOKEN_KEY, HOST_NAME_KEY, IS_READY_KEY, Member, MemberId,
    PLAYER_NAME_KEY, Session, SessionId, member_attributes,
};
