//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used by every engine generation.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Network/Round/Reader ── publish(Event) ──► Bus ──► dispatcher ──► SubscriberSet::emit
//!                                                                        │
//!                                                               ┌────────┴────────┐
//!                                                               ▼                 ▼
//!                                                            Metrics           Custom
//! ```
//!
//! Delivery here is lossy: a lagging dispatcher or a full queue drops events
//! for the affected subscriber. Supervisory state never depends on it; the
//! telemetry bridge is applied inline by the bus.

mod set;
mod subscribe;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;
