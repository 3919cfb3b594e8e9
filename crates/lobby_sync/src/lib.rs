//! # lobby_sync
//!
//! Keeps a local view of one remotely hosted session in step with the
//! session registry.
//!
//! An external driver calls [`SessionController::tick`] once per logical
//! tick. Each tick issues at most one registry call: a heartbeat when the
//! local member hosts the session, otherwise a poll. Poll results are
//! diffed against the current roster and listeners hear about real changes
//! through an [`EventBus`] subscription.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use lobby_model::MemberId;
//! use lobby_net::{NatsConnection, NatsRegistry};
//! use lobby_sync::{SessionController, SyncConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let me = MemberId::new("player-1");
//! let registry = NatsRegistry::new(NatsConnection::connect().await?, me.clone());
//! let mut controller = SessionController::new(Arc::new(registry), me, SyncConfig::default());
//! let mut events = controller.subscribe();
//!
//! controller.create("Alpha", 2, "Ada", false, "relay-token").await?;
//! loop {
//!     controller.tick(Instant::now()).await;
//!     while let Some(event) = events.try_recv() {
//!         println!("{event:?}");
//!     }
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::SyncConfig;
pub use controller::{SessionController, TeardownHandle};
pub use error::SessionError;
pub use events::{EventBus, ExitReason, SessionEvent, Subscription, SubscriptionId};
pub use scheduler::{ListRefreshTimer, SyncAction, SyncScheduler};
pub use state::{Role, SessionLifecycleState};
