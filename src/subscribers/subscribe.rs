//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging event handlers into every
//! engine generation. Each subscriber is driven by a dedicated worker loop fed
//! by a bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block
//!   the producers nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** (warn).
//! - Subscribers are shared across generations (`Arc`), so any state they keep
//!   outlives a restart.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use minervisor::{DomainEvent, Event, Subscribe};
//!
//! struct ConfirmedCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for ConfirmedCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if let DomainEvent::NetworkResultConfirmed { .. } = ev.kind {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "confirmed-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
