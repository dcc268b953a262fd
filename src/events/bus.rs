//! # Event bus for collaborator events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple producers (network, round, reader).
//!
//! ## Architecture
//! ```text
//! Producers (many threads):
//!   Network ──┐            ┌─► InlineHandler::handle   (publishing thread, lossless)
//!   Round   ──┼──► Bus ────┤
//!   Reader  ──┘            └─► broadcast ──► dispatcher ──► SubscriberSet
//!                                            (in Generation)
//! ```
//!
//! Every engine generation gets its own bus.
//!
//! ## Rules
//! - **Inline first**: the inline handler has seen the event before `publish()` returns.
//! - **Non-blocking broadcast**: the broadcast half never blocks and needs no runtime context.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//!   The inline handler never lags.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::{DomainEvent, Event};

/// Handler run synchronously on the publishing thread for every event.
///
/// Must be quick and must not block: producers wait for it.
pub trait InlineHandler: Send + Sync + 'static {
    fn handle(&self, event: &Event);
}

/// Broadcast channel for collaborator events, with an optional inline handler.
///
/// ### Properties
/// - **Lossless inline path**: every event reaches the inline handler exactly once.
/// - **Fire-and-forget broadcast**: no delivery guarantees for receivers.
/// - **Cloneable**: cheap to clone (internally holds `Arc`-backed handles).
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    inline: Option<Arc<dyn InlineHandler>>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx, inline: None }
    }

    /// Creates a bus whose events are first applied to `handler` on the publishing thread.
    pub fn with_inline(capacity: usize, handler: Arc<dyn InlineHandler>) -> Self {
        Self {
            inline: Some(handler),
            ..Self::new(capacity)
        }
    }

    /// Applies the inline handler, then publishes to all active receivers.
    ///
    /// If there are no receivers, the broadcast copy is dropped.
    pub fn publish(&self, ev: Event) {
        if let Some(handler) = &self.inline {
            handler.handle(&ev);
        }
        let _ = self.tx.send(ev);
    }

    /// Wraps `kind` into an [`Event`] and publishes it.
    pub fn emit(&self, kind: DomainEvent) {
        self.publish(Event::now(kind));
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("receivers", &self.tx.receiver_count())
            .field("inline", &self.inline.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_receivers_is_dropped() {
        let bus = Bus::new(0);
        bus.emit(DomainEvent::NetworkStateChange { block_number: 7 });
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_sees_events_in_order() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(DomainEvent::NetworkStateChange { block_number: 1 });
        bus.emit(DomainEvent::NetworkStateChange { block_number: 2 });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.seq < second.seq);
        assert_eq!(
            second.kind,
            DomainEvent::NetworkStateChange { block_number: 2 }
        );
    }

    #[derive(Default)]
    struct Recorder(parking_lot::Mutex<Vec<u64>>);

    impl InlineHandler for Recorder {
        fn handle(&self, event: &Event) {
            self.0.lock().push(event.seq);
        }
    }

    #[test]
    fn test_inline_handler_sees_burst_beyond_capacity() {
        let recorder = Arc::new(Recorder::default());
        let bus = Bus::with_inline(4, recorder.clone());
        let mut rx = bus.subscribe();

        for block_number in 0..100 {
            bus.emit(DomainEvent::NetworkStateChange { block_number });
        }

        let seen = recorder.0.lock().clone();
        assert_eq!(seen.len(), 100);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(96))
        ));
    }

    #[test]
    fn test_publish_from_plain_thread() {
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();
        let producer = bus.clone();

        std::thread::spawn(move || {
            producer.emit(DomainEvent::NetworkResultConfirmed { deadline: 42 });
        })
        .join()
        .unwrap();

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, DomainEvent::NetworkResultConfirmed { deadline: 42 });
    }
}
