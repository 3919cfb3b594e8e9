//! # lobby_net
//!
//! Client side of the remote session registry boundary.
//!
//! This crate provides:
//!
//! - [`registry`] — the [`SessionRegistry`] trait and its NATS-backed
//!   implementation, [`NatsRegistry`].
//! - [`subjects`] — registry subject builders.
//! - [`messages`] — request payloads and the reply envelope.
//! - [`codec`] — MessagePack serialisation/deserialisation helpers.
//! - [`connection`] — NATS connection management.
//! - [`error`] — transport and registry error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod registry;
pub mod subjects;

pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::{NetError, RegistryError};
pub use messages::{CreateSessionRequest, ErrorReason, SessionFilter};
pub use registry::{JoinOptions, NatsRegistry, SessionRegistry};
