//! # Supervisory state shared by the scheduler and the telemetry bridge.
//!
//! [`SupervisorState`] is the only mutable resource shared between producer
//! threads (through the bridge) and the restart scheduler.
//!
//! ## Architecture
//! ```text
//! Bus::publish ──► EventTelemetryBridge (inline) ──► SupervisorState (Mutex)
//!                                                          │
//!                                         watch<round_finished>
//!                                                          ▼
//!                                        RestartScheduler::drain()
//! ```
//!
//! ## Rules
//! - Every field is read and written under one mutex.
//! - `round_finished` starts `true`: before the first engine starts no round is open.
//! - `progress_log_step` is reset to `log_steps_per_round` on round start and
//!   only counts down afterwards, never below zero.
//! - Round completion is mirrored into a watch channel (updated under the lock)
//!   so the drain can wake without waiting for its next poll.

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::telemetry::progress::{self, ProgressReport, ProgressSample};

#[derive(Debug)]
struct Inner {
    round_finished: bool,
    current_block_number: u64,
    progress_log_step: u32,
}

/// Point-in-time copy of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub round_finished: bool,
    pub current_block_number: u64,
    pub progress_log_step: u32,
    pub log_steps_per_round: u32,
}

/// Round bookkeeping shared across threads.
#[derive(Debug)]
pub struct SupervisorState {
    inner: Mutex<Inner>,
    finished_tx: watch::Sender<bool>,
    log_steps_per_round: u32,
}

impl SupervisorState {
    /// Creates the state with no open round.
    pub fn new(log_steps_per_round: u32) -> Self {
        let (finished_tx, _rx) = watch::channel(true);
        Self {
            inner: Mutex::new(Inner {
                round_finished: true,
                current_block_number: 0,
                progress_log_step: log_steps_per_round,
            }),
            finished_tx,
            log_steps_per_round,
        }
    }

    #[inline]
    pub fn log_steps_per_round(&self) -> u32 {
        self.log_steps_per_round
    }

    /// Opens a round: `round_finished = false`, countdown reset.
    pub fn begin_round(&self) {
        let mut inner = self.inner.lock();
        inner.round_finished = false;
        inner.progress_log_step = self.log_steps_per_round;
        self.finished_tx.send_replace(false);
    }

    /// Closes the current round.
    pub fn finish_round(&self) {
        let mut inner = self.inner.lock();
        inner.round_finished = true;
        self.finished_tx.send_replace(true);
    }

    pub fn is_round_finished(&self) -> bool {
        self.inner.lock().round_finished
    }

    /// Receiver that observes every `round_finished` transition.
    pub fn round_finished_signal(&self) -> watch::Receiver<bool> {
        self.finished_tx.subscribe()
    }

    pub fn set_current_block_number(&self, block_number: u64) {
        self.inner.lock().current_block_number = block_number;
    }

    pub fn current_block_number(&self) -> u64 {
        self.inner.lock().current_block_number
    }

    /// Restores the full progress-log countdown.
    pub fn reset_progress_log_step(&self) {
        self.inner.lock().progress_log_step = self.log_steps_per_round;
    }

    pub fn progress_log_step(&self) -> u32 {
        self.inner.lock().progress_log_step
    }

    /// Runs the progress gate against the countdown, atomically.
    ///
    /// Returns the report when a progress line is due.
    pub fn record_progress(&self, sample: &ProgressSample) -> Option<ProgressReport> {
        let mut inner = self.inner.lock();
        progress::evaluate(sample, self.log_steps_per_round, &mut inner.progress_log_step)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.inner.lock();
        StateSnapshot {
            round_finished: inner.round_finished,
            current_block_number: inner.current_block_number,
            progress_log_step: inner.progress_log_step,
            log_steps_per_round: self.log_steps_per_round,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_state_has_no_open_round() {
        let state = SupervisorState::new(5);
        let snap = state.snapshot();
        assert!(snap.round_finished);
        assert_eq!(snap.progress_log_step, 5);
        assert_eq!(snap.current_block_number, 0);
    }

    #[test]
    fn test_round_transitions_drive_signal() {
        let state = SupervisorState::new(5);
        let rx = state.round_finished_signal();

        state.begin_round();
        assert!(!state.is_round_finished());
        assert!(!*rx.borrow());

        state.finish_round();
        assert!(state.is_round_finished());
        assert!(*rx.borrow());
    }

    #[test]
    fn test_begin_round_resets_countdown() {
        let state = SupervisorState::new(3);
        let sample = ProgressSample {
            capacity_bytes: 300,
            remaining_capacity_bytes: 0,
            elapsed_time_ms: 1,
        };
        assert!(state.record_progress(&sample).is_some());
        assert_eq!(state.progress_log_step(), 0);
        assert!(state.record_progress(&sample).is_none());

        state.begin_round();
        assert_eq!(state.progress_log_step(), 3);
        assert!(state.record_progress(&sample).is_some());
    }

    #[test]
    fn test_concurrent_progress_never_exceeds_budget() {
        let state = Arc::new(SupervisorState::new(10));
        let emitted = Arc::new(std::sync::atomic::AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let state = Arc::clone(&state);
                let emitted = Arc::clone(&emitted);
                std::thread::spawn(move || {
                    for k in 0..600u64 {
                        let remaining = 1_000_000u64.saturating_sub((k * 8 + t) * 250);
                        let sample = ProgressSample {
                            capacity_bytes: 1_000_000,
                            remaining_capacity_bytes: remaining,
                            elapsed_time_ms: k + 1,
                        };
                        if state.record_progress(&sample).is_some() {
                            emitted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(emitted.load(std::sync::atomic::Ordering::SeqCst) <= 10);
        assert_eq!(state.progress_log_step(), 0);
    }
}
