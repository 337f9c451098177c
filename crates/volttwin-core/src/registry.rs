//! Live subscriber set and best-effort fan-out.
//!
//! The registry owns every connected subscriber: its bounded outbound
//! queue and its [`Liveness`] state. Fan-out is at-most-once and
//! best-effort -- a subscriber whose queue is full simply misses that
//! update and resumes with the next one; there is no replay and no
//! backpressure onto the tick loop. Per-subscriber delivery order is
//! FIFO; nothing is guaranteed across subscribers.
//!
//! Connection tasks drive the liveness machine through
//! [`SubscriberRegistry::begin_probe`] and
//! [`SubscriberRegistry::acknowledge`]; the registry is tolerant of
//! removal at any point, including mid-broadcast.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;
use volttwin_types::OutboundMessage;

use crate::supervisor::{Liveness, ProbeDecision};

/// Capacity of each subscriber's outbound queue.
///
/// A subscriber that falls further behind than this misses updates
/// until it drains; it is never disconnected for being slow.
const OUTBOUND_QUEUE_CAPACITY: usize = 32;

/// Opaque identifier for one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registered subscriber: its queue and its liveness state.
#[derive(Debug)]
struct Subscriber {
    tx: mpsc::Sender<OutboundMessage>,
    liveness: Liveness,
}

/// Registry of all currently connected subscribers.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<BTreeMap<SubscriberId, Subscriber>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// The subscriber starts [`Liveness::Alive`]. Returns its id and
    /// the receiving end of its outbound queue; dropping the receiver
    /// (or calling [`remove`](Self::remove)) ends delivery.
    pub async fn register(&self) -> (SubscriberId, mpsc::Receiver<OutboundMessage>) {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.subscribers.write().await.insert(
            id,
            Subscriber {
                tx,
                liveness: Liveness::Alive,
            },
        );
        debug!(subscriber = %id, "subscriber registered");
        (id, rx)
    }

    /// Deregister a subscriber and release its queue.
    ///
    /// Removing an unknown or already-removed id is a no-op; returns
    /// whether anything was removed.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().await.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, "subscriber removed");
        }
        removed
    }

    /// Fan a message out to every registered subscriber.
    ///
    /// Full or closed queues are silently skipped. Returns the number
    /// of subscribers the message was handed to.
    pub async fn publish(&self, message: &OutboundMessage) -> usize {
        let subscribers = self.subscribers.read().await;
        let mut delivered: usize = 0;
        for (id, subscriber) in subscribers.iter() {
            match subscriber.tx.try_send(message.clone()) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(subscriber = %id, "outbound queue full, update skipped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(subscriber = %id, "outbound queue closed, update skipped");
                }
            }
        }
        delivered
    }

    /// Advance a subscriber's liveness machine on its probe timer.
    ///
    /// Returns `None` when the subscriber is no longer registered.
    pub async fn begin_probe(&self, id: SubscriberId) -> Option<ProbeDecision> {
        let mut subscribers = self.subscribers.write().await;
        subscribers
            .get_mut(&id)
            .map(|subscriber| subscriber.liveness.on_probe())
    }

    /// Record a pong acknowledgment for a subscriber.
    ///
    /// Returns whether the subscriber was still registered.
    pub async fn acknowledge(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        match subscribers.get_mut(&id) {
            Some(subscriber) => {
                subscriber.liveness.on_ack();
                true
            }
            None => false,
        }
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use volttwin_types::Heartbeat;

    use super::*;

    fn heartbeat() -> OutboundMessage {
        OutboundMessage::Heartbeat(Heartbeat::now())
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let registry = SubscriberRegistry::new();
        let (_id_a, mut rx_a) = registry.register().await;
        let (_id_b, mut rx_b) = registry.register().await;

        let delivered = registry.publish(&heartbeat()).await;
        assert_eq!(delivered, 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn removed_subscriber_receives_nothing_further() {
        let registry = SubscriberRegistry::new();
        let (id, mut rx) = registry.register().await;

        assert!(registry.remove(id).await);
        let delivered = registry.publish(&heartbeat()).await;
        assert_eq!(delivered, 0);
        // Sender dropped on removal, so the queue reports closed.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.register().await;
        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
    }

    #[tokio::test]
    async fn slow_subscriber_misses_updates_without_blocking() {
        let registry = SubscriberRegistry::new();
        let (_id, rx) = registry.register().await;

        // Never drain the queue: once full, publishes skip this
        // subscriber instead of blocking the caller.
        let mut skipped = 0_usize;
        for _ in 0..40 {
            if registry.publish(&heartbeat()).await == 0 {
                skipped = skipped.saturating_add(1);
            }
        }
        assert!(skipped > 0, "overflowing queue should be skipped");
        drop(rx);
    }

    #[tokio::test]
    async fn probe_lifecycle_detects_dead_subscriber() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.register().await;

        // First probe: ping goes out.
        assert_eq!(
            registry.begin_probe(id).await,
            Some(ProbeDecision::SendPing)
        );
        // Acknowledged in time: next probe pings again.
        assert!(registry.acknowledge(id).await);
        assert_eq!(
            registry.begin_probe(id).await,
            Some(ProbeDecision::SendPing)
        );
        // No acknowledgment before the next timer: expired.
        assert_eq!(registry.begin_probe(id).await, Some(ProbeDecision::Expired));
    }

    #[tokio::test]
    async fn probe_on_unknown_subscriber_returns_none() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.register().await;
        registry.remove(id).await;
        assert_eq!(registry.begin_probe(id).await, None);
        assert!(!registry.acknowledge(id).await);
    }
}
