//! # Collaborator contracts.
//!
//! The mining engine is an ensemble of three external components. The
//! scheduler only needs the handful of operations below; everything else
//! (deadline computation, pool protocol, plot scanning) lives behind them.
//!
//! Producers publish their events on the [`Bus`](crate::Bus) handed to the
//! factory through [`EngineContext`](crate::EngineContext).

/// Common surface of every collaborator.
pub trait Collaborator: Send + Sync + 'static {
    /// Returns a stable, human-readable component name.
    fn name(&self) -> &str;

    /// Releases held resources (sockets, file handles, worker threads).
    ///
    /// Called once when the engine instance is destroyed, after timers stopped.
    fn release(&self) {}
}

/// Network / pool communication.
///
/// Emits `NetworkStateChange`, `NetworkLastWinner`, `NetworkResultConfirmed`,
/// `NetworkDevResultConfirmed` and `NetworkResultError`.
pub trait Network: Collaborator {
    /// Starts polling the network for mining info; the first round follows.
    fn start_mining(&self);

    /// Stops the polling timer. No new rounds are triggered afterwards.
    fn stop_timer(&self);
}

/// Mining-round state machine.
///
/// Emits `RoundStarted`, `RoundFinished`, `RoundSingleResult` and
/// `RoundSingleResultSkipped`.
pub trait Round: Collaborator {
    /// Stops the round timers. A round already in progress runs to completion.
    fn stop_timer(&self);
}

/// Plot-file reader.
///
/// Emits `ReaderProgressChanged` and `ReaderCorruptFile`.
pub trait Reader: Collaborator {}
