//! Lifecycle notifications for UI and other collaborators.
//!
//! Subscribers each get a bounded channel. [`EventBus::publish`] never
//! blocks: it hands the event to every live subscriber within the tick that
//! produced it. A subscriber whose receiver was dropped is removed silently.
//! A subscriber that stopped draining loses `Changed` events with a warning,
//! but a `NotInSession` event is parked in a one-slot overflow and handed out
//! after the queued events.

use std::sync::{Arc, Mutex, PoisonError};

use lobby_model::Session;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Why the local member is no longer in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The local member left, or the host closed its own session.
    Left,
    /// The registry no longer knows the session.
    SessionClosed,
    /// The host removed the local member.
    MemberRemoved,
}

/// A notification raised by the session controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The roster changed. `is_ready` is the readiness verdict for the new
    /// snapshot.
    Changed { session: Session, is_ready: bool },
    /// The local member is no longer in a session.
    NotInSession { reason: ExitReason },
}

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Holds the latest exit event that did not fit a full queue.
type Overflow = Arc<Mutex<Option<SessionEvent>>>;

fn take_overflow(overflow: &Overflow) -> Option<SessionEvent> {
    overflow.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<SessionEvent>,
    overflow: Overflow,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. Returns `None` once unsubscribed or the bus
    /// is gone and every queued event was read.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        if let Some(event) = self.try_recv() {
            return Some(event);
        }
        match self.receiver.recv().await {
            Some(event) => Some(event),
            None => take_overflow(&self.overflow),
        }
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.receiver
            .try_recv()
            .ok()
            .or_else(|| take_overflow(&self.overflow))
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Observer list of bounded subscriber channels.
#[derive(Debug)]
pub struct EventBus {
    capacity: usize,
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    sender: mpsc::Sender<SessionEvent>,
    overflow: Overflow,
}

impl EventBus {
    /// Create a bus whose subscriber channels hold `capacity` events.
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (sender, receiver) = mpsc::channel(self.capacity);
        let overflow = Overflow::default();
        self.subscribers.push(Subscriber {
            id,
            sender,
            overflow: overflow.clone(),
        });
        debug!(subscription = id.0, "subscriber added");
        Subscription {
            id,
            receiver,
            overflow,
        }
    }

    /// Remove a subscription. Events published afterwards are not delivered
    /// to it. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| sub.id != id);
        self.subscribers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|sub| match sub.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(event @ SessionEvent::NotInSession { .. })) => {
                    warn!(subscription = sub.id.0, "subscriber queue full, parking exit event");
                    *sub.overflow.lock().unwrap_or_else(PoisonError::into_inner) = Some(event);
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(subscription = sub.id.0, "subscriber queue full, dropping event");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscription = sub.id.0, "subscriber gone, removing");
                    false
                }
            });
    }
}
