//! # Domain events emitted by the mining collaborators.
//!
//! The [`DomainEvent`] enum classifies events across three producers:
//! - **Round events**: round lifecycle and single results (round state machine)
//! - **Network events**: block changes, winners, confirmations, pool errors
//! - **Reader events**: scan progress and corrupt plot files
//!
//! The [`Event`] struct wraps a domain event with a timestamp and a global
//! sequence number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use minervisor::{DomainEvent, Event, NO_DEADLINE};
//!
//! let ev = Event::now(DomainEvent::RoundFinished {
//!     block_number: 500_000,
//!     round_duration_ms: 12_345,
//!     best_committed_deadline: NO_DEADLINE,
//! });
//!
//! assert_eq!(ev.kind.label(), "round_finished");
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Deadline sentinel meaning "no deadline" (no committed result, no target).
pub const NO_DEADLINE: u64 = u64::MAX;

/// One result confirmed by a dev pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevPoolResult {
    /// Calculated deadline in seconds.
    pub deadline: u64,
}

/// Classification and payload of collaborator events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    // === Round events ===
    /// A new round started for a block.
    RoundStarted {
        block_number: u64,
        scoop_number: u32,
        capacity_bytes: u64,
        /// [`NO_DEADLINE`] when the network does not announce a target.
        target_deadline: u64,
        base_target: u64,
    },

    /// The round for a block has finished.
    RoundFinished {
        block_number: u64,
        round_duration_ms: u64,
        /// [`NO_DEADLINE`] when nothing was committed this round.
        best_committed_deadline: u64,
    },

    /// A calculated result was submitted.
    RoundSingleResult { deadline: u64, is_pool_mining: bool },

    /// A calculated result exceeded the target deadline and was not submitted.
    RoundSingleResultSkipped { deadline: u64, target_deadline: u64 },

    // === Network events ===
    /// The network moved to a new block.
    NetworkStateChange { block_number: u64 },

    /// Winner announcement for the previous block.
    NetworkLastWinner {
        last_block_number: u64,
        winner_id: Arc<str>,
    },

    /// A submitted deadline was confirmed.
    NetworkResultConfirmed { deadline: u64 },

    /// A dev pool confirmed a batch of results.
    NetworkDevResultConfirmed {
        response: Arc<str>,
        block_number: u64,
        results: Vec<DevPoolResult>,
    },

    /// The pool answered with a deadline that differs from the calculated one.
    NetworkResultError {
        strange_deadline: u64,
        calculated_deadline: u64,
        block_number: u64,
        nonce: u64,
    },

    // === Reader events ===
    /// Scan progress for the current round.
    ReaderProgressChanged {
        capacity_bytes: u64,
        remaining_capacity_bytes: u64,
        elapsed_time_ms: u64,
    },

    /// A plot file produced results inconsistent with its layout.
    ReaderCorruptFile {
        file_path: PathBuf,
        number_of_chunks: u64,
        number_of_parts: u64,
        block_number: u64,
    },
}

impl DomainEvent {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DomainEvent::RoundStarted { .. } => "round_started",
            DomainEvent::RoundFinished { .. } => "round_finished",
            DomainEvent::RoundSingleResult { .. } => "round_single_result",
            DomainEvent::RoundSingleResultSkipped { .. } => "round_single_result_skipped",
            DomainEvent::NetworkStateChange { .. } => "network_state_change",
            DomainEvent::NetworkLastWinner { .. } => "network_last_winner",
            DomainEvent::NetworkResultConfirmed { .. } => "network_result_confirmed",
            DomainEvent::NetworkDevResultConfirmed { .. } => "network_dev_result_confirmed",
            DomainEvent::NetworkResultError { .. } => "network_result_error",
            DomainEvent::ReaderProgressChanged { .. } => "reader_progress_changed",
            DomainEvent::ReaderCorruptFile { .. } => "reader_corrupt_file",
        }
    }
}

/// Domain event with delivery metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event payload.
    pub kind: DomainEvent,
}

impl Event {
    /// Creates a new event with current timestamp and next sequence number.
    pub fn now(kind: DomainEvent) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
        }
    }
}

impl From<DomainEvent> for Event {
    fn from(kind: DomainEvent) -> Self {
        Event::now(kind)
    }
}
