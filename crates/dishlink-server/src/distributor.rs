//! In-memory fan-out point for the sentence stream.
//!
//! The [`Distributor`] holds the current set of sinks (one per connected
//! TCP client, or the single UDP target) and hands each published pair to
//! every sink's bounded buffer. Publishing never blocks: a sink whose
//! buffer is full is considered stalled and removed on the spot, as is a
//! sink whose consumer has gone away. Membership is the only state shared
//! between the poll task and the transport tasks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dishlink_models::SentencePair;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Capacity of each sink's pair buffer. A consumer that falls this many
/// poll cycles behind is dropped rather than allowed to slow the stream.
pub const SINK_BUFFER_PAIRS: usize = 32;

// ---------------------------------------------------------------------------
// SubscriberId
// ---------------------------------------------------------------------------

/// Opaque handle identifying one subscribed sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// The receiving half of one sink, handed to the transport that owns the
/// socket. Dropping the receiver (or letting its buffer fill) causes the
/// distributor to forget the sink on the next publish.
pub struct Subscription {
    /// Handle for explicit unsubscription.
    pub id: SubscriberId,
    /// Stream of sentence pairs, one per poll cycle, cycle order preserved.
    pub receiver: mpsc::Receiver<Arc<SentencePair>>,
}

// ---------------------------------------------------------------------------
// Distributor
// ---------------------------------------------------------------------------

/// Fan-out registry mapping subscriber ids to their pair buffers.
#[derive(Default)]
pub struct Distributor {
    sinks: Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<SentencePair>>>>,
}

impl Distributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new sink and return its subscription.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(SINK_BUFFER_PAIRS);
        self.lock_sinks().insert(id, tx);
        debug!(subscriber = %id, "sink subscribed");
        Subscription { id, receiver: rx }
    }

    /// Remove a sink. Idempotent; safe to call for an already-dropped id.
    pub fn unsubscribe(&self, id: &SubscriberId) {
        if self.lock_sinks().remove(id).is_some() {
            debug!(subscriber = %id, "sink unsubscribed");
        }
    }

    /// Deliver one pair to every current sink.
    ///
    /// Non-blocking by construction: each sink gets a `try_send` into its
    /// own buffer, so one stalled or broken consumer can neither delay
    /// the next poll cycle nor affect delivery to the others. Failed
    /// sinks are removed immediately.
    pub fn publish(&self, pair: &Arc<SentencePair>) {
        self.lock_sinks().retain(|id, tx| match tx.try_send(pair.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(subscriber = %id, "sink buffer full, dropping stalled subscriber");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(subscriber = %id, "sink closed, dropping subscriber");
                false
            }
        });
    }

    /// Number of currently subscribed sinks.
    pub fn subscriber_count(&self) -> usize {
        self.lock_sinks().len()
    }

    fn lock_sinks(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Arc<SentencePair>>>> {
        // A poisoned lock only means another task panicked mid-mutation of
        // the map; the map itself is still usable.
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dishlink_models::{SentenceOptions, TelemetrySample, nmea};

    fn pair(second: u32) -> Arc<SentencePair> {
        let sample = TelemetrySample {
            latitude: 37.7749,
            longitude: -122.4194,
            altitude_m: 30.0,
            speed_knots: 0.0,
            heading_deg: 0.0,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, second).unwrap(),
            fix_valid: true,
        };
        Arc::new(nmea::encode(&sample, &SentenceOptions::default()))
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_pair_in_order() {
        let distributor = Distributor::new();
        let mut a = distributor.subscribe();
        let mut b = distributor.subscribe();

        distributor.publish(&pair(1));
        distributor.publish(&pair(2));

        for sub in [&mut a, &mut b] {
            let first = sub.receiver.recv().await.unwrap();
            let second = sub.receiver.recv().await.unwrap();
            assert!(first.rmc.contains("120001.00"));
            assert!(second.rmc.contains("120002.00"));
        }
    }

    #[tokio::test]
    async fn stalled_subscriber_is_dropped_others_unaffected() {
        let distributor = Distributor::new();
        let stalled = distributor.subscribe();
        let mut healthy = distributor.subscribe();
        assert_eq!(distributor.subscriber_count(), 2);

        // Fill the stalled sink's buffer, then publish one more. The
        // healthy sink is drained as we go so it never fills.
        for i in 0..=SINK_BUFFER_PAIRS {
            distributor.publish(&pair(u32::try_from(i).unwrap()));
            let received = healthy.receiver.recv().await.unwrap();
            assert!(received.rmc.contains(&format!("1200{i:02}.00")));
        }

        assert_eq!(distributor.subscriber_count(), 1);
        // Keep the stalled subscription alive until here so the drop was
        // caused by the full buffer, not a closed channel.
        drop(stalled);
    }

    #[tokio::test]
    async fn closed_subscriber_is_forgotten_on_next_publish() {
        let distributor = Distributor::new();
        let sub = distributor.subscribe();
        drop(sub.receiver);
        distributor.publish(&pair(0));
        assert_eq!(distributor.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let distributor = Distributor::new();
        let sub = distributor.subscribe();
        distributor.unsubscribe(&sub.id);
        distributor.unsubscribe(&sub.id);
        assert_eq!(distributor.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_no_op() {
        let distributor = Distributor::new();
        distributor.publish(&pair(0));
        assert_eq!(distributor.subscriber_count(), 0);
    }
}
