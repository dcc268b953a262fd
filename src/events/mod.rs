//! Collaborator events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used by the
//! mining collaborators to publish events and by each engine generation's
//! dispatcher to consume them.
//!
//! ## Contents
//! - [`DomainEvent`], [`Event`] event payloads and delivery metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`, plus a lossless [`InlineHandler`]
//!
//! ## Quick reference
//! - **Publishers**: `Network`, `Round` and `Reader` collaborators (any thread).
//! - **Consumers**: the generation's telemetry bridge (inline, on the publishing
//!   thread) and the per-generation dispatcher, which fans out to the user
//!   subscribers' `SubscriberSet`.

mod bus;
mod event;

pub use bus::{Bus, InlineHandler};
pub use event::{DevPoolResult, DomainEvent, Event, NO_DEADLINE};
