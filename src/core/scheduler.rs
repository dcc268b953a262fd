//! # RestartScheduler: periodic, drain-safe restarts of the mining engine.
//!
//! The [`RestartScheduler`] owns the one live engine generation and replaces it
//! every [`Config::restart_interval`]. A restart never interrupts a running
//! round: timers are stopped first, then the scheduler waits for the round to
//! finish before the old engine is destroyed.
//!
//! ## High-level architecture
//! ```text
//! run(token):
//!   tick detector ── interval(restart_interval) ── try_send ──► mpsc(1) ──► cycle worker
//!     (first tick immediately; Full → tick absorbed)                 │
//!                                                                    ▼
//! restart_cycle(n):                                        (strictly serialized)
//!   if a generation is live:
//!     1. stop_timers()              network, then round
//!     2. drain()                    watch<round_finished> + poll fallback, no timeout
//!     3. reset progress_log_step
//!     4. teardown()                 destroy engine, flush dispatcher
//!   5. Generation::launch(n)        fresh bus + bridge, then EngineFactory::build
//!      ├─ Err → RuntimeError::EngineBuild (fatal, returned from run)
//!      └─ Ok  → banner, start_mining()
//!
//! Shutdown path (token cancelled):
//!   tick detector stops ─► stop_timers() ─► drain() bounded by cfg.grace ─► teardown()
//!                                            └─ timeout → RuntimeError::GraceExceeded
//! ```
//!
//! ## Rules
//! - At most one engine instance is live at any time.
//! - The drain reads state only after `stop_timers()` returned; the bridge runs on the
//!   publishing thread, so every event published before that point is already applied.
//! - Cancellation never aborts a cycle already running; it is observed between cycles.
//! - Ticks pending when a cycle ends are discarded.
//!
//! ## Example
//! ```rust,no_run
//! use minervisor::{Config, EngineContext, EngineError, EngineInstance, FactoryFn, RestartScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = FactoryFn::arc("engine", |_ctx: EngineContext| async {
//!         Err::<EngineInstance, _>(EngineError::Unavailable { resource: "plots".into() })
//!     });
//!
//!     let scheduler = RestartScheduler::builder(Config::default(), factory).build()?;
//!     scheduler.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::builder::SchedulerBuilder;
use super::generation::Generation;
use super::shutdown;
use super::state::SupervisorState;
use crate::config::Config;
use crate::engine::FactoryRef;
use crate::error::RuntimeError;
use crate::subscribers::Subscribe;

/// Drives engine generations: builds, starts, drains and replaces them.
pub struct RestartScheduler {
    cfg: Config,
    factory: FactoryRef,
    state: Arc<SupervisorState>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RestartScheduler {
    /// Starts wiring a scheduler for `factory`.
    pub fn builder(cfg: Config, factory: FactoryRef) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg, factory)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        factory: FactoryRef,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let state = Arc::new(SupervisorState::new(cfg.progress_log_steps_per_round));
        Self {
            cfg,
            factory,
            state,
            subscribers,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Round bookkeeping shared with every generation's telemetry bridge.
    pub fn state(&self) -> &Arc<SupervisorState> {
        &self.state
    }

    /// Runs restart cycles until `token` is cancelled or an engine cannot be built.
    ///
    /// Returns `Ok(())` after a clean shutdown, [`RuntimeError::EngineBuild`] when the
    /// factory fails, or [`RuntimeError::GraceExceeded`] when the final round did not
    /// finish within [`Config::grace`].
    pub async fn run(&self, token: CancellationToken) -> Result<(), RuntimeError> {
        let (tick_tx, mut tick_rx) = mpsc::channel::<u64>(1);
        let detector_stop = token.child_token();
        let detector = spawn_tick_detector(self.cfg.restart_interval, tick_tx, detector_stop.clone());

        let mut current: Option<Generation> = None;
        let mut next_generation = 1u64;

        let outcome = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break Ok(()),
                tick = tick_rx.recv() => {
                    let Some(tick) = tick else { break Ok(()) };
                    debug!(tick, generation = next_generation, "restart cycle");

                    if let Err(e) = self.restart_cycle(&mut current, next_generation).await {
                        error!(error = %e, label = e.as_label(), factory = self.factory.name(), "mining engine could not be started");
                        break Err(e);
                    }
                    next_generation += 1;

                    let mut absorbed = 0u32;
                    while tick_rx.try_recv().is_ok() {
                        absorbed += 1;
                    }
                    if absorbed > 0 {
                        debug!(absorbed, "restart ticks absorbed while the cycle was running");
                    }
                }
            }
        };

        detector_stop.cancel();
        if let Err(e) = detector.await {
            warn!(error = %e, "tick detector ended abnormally");
        }

        let stopped = self.shutdown(current.take()).await;
        outcome.and(stopped)
    }

    /// Runs until SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows), then shuts down gracefully.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let signals = tokio::spawn(async move {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(()) => {
                    info!("shutdown signal received");
                    trigger.cancel();
                }
                Err(e) => warn!(error = %e, "signal handlers unavailable; running until the engine fails"),
            }
        });

        let res = self.run(token).await;
        signals.abort();
        res
    }

    async fn restart_cycle(
        &self,
        current: &mut Option<Generation>,
        number: u64,
    ) -> Result<(), RuntimeError> {
        if let Some(mut old) = current.take() {
            old.stop_timers();
            self.drain().await;
            info!(
                "mining engine will restart now ... restartInterval: {}",
                self.cfg.restart_interval_label()
            );
            self.state.reset_progress_log_step();
            old.teardown().await;
        }

        info!("start the engines ...");
        let generation = Generation::launch(
            number,
            &self.cfg,
            self.factory.as_ref(),
            &self.state,
            &self.subscribers,
        )
        .await
        .map_err(|source| RuntimeError::EngineBuild {
            generation: number,
            source,
        })?;

        self.log_banner();
        generation.start();
        debug!(generation = generation.number(), "mining engine started");
        *current = Some(generation);
        Ok(())
    }

    /// Waits until the running round has finished.
    ///
    /// Wakes on the completion signal or every `poll_interval`. A lost signal
    /// leaves plain polling.
    async fn drain(&self) {
        if self.state.is_round_finished() {
            return;
        }
        info!("waiting for round to finish ... to stop and restart mining engine.");

        let poll = self.cfg.poll_interval;
        let mut signal = Some(self.state.round_finished_signal());
        while !self.state.is_round_finished() {
            let lost = match signal.as_mut() {
                Some(rx) => tokio::select! {
                    changed = rx.changed() => changed.is_err(),
                    _ = time::sleep(poll) => false,
                },
                None => {
                    time::sleep(poll).await;
                    false
                }
            };
            if lost {
                warn!(poll = ?poll, "round completion signal lost; polling instead");
                signal = None;
            }
        }
    }

    async fn shutdown(&self, current: Option<Generation>) -> Result<(), RuntimeError> {
        let Some(mut generation) = current else {
            return Ok(());
        };
        info!(generation = generation.number(), "stopping mining engine");
        generation.stop_timers();

        let grace = self.cfg.grace;
        let drained = grace.is_zero() || time::timeout(grace, self.drain()).await.is_ok();
        generation.teardown().await;

        if drained {
            Ok(())
        } else {
            warn!(grace = ?grace, "round still running after shutdown grace; engine destroyed");
            Err(RuntimeError::GraceExceeded { grace })
        }
    }

    fn log_banner(&self) {
        info!("");
        info!(":::::::::::::::::::::::::::::::::::::::::::::::::::::::");
        info!("   minervisor {}", env!("CARGO_PKG_VERSION"));
        info!("   supervised PoC mining engine");
        info!(
            "   restartInterval '{}', progress lines per round '{}'",
            self.cfg.restart_interval_label(),
            self.state.log_steps_per_round()
        );
        info!("   engine factory '{}'", self.factory.name());
        info!(":::::::::::::::::::::::::::::::::::::::::::::::::::::::");
    }
}

impl std::fmt::Debug for RestartScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestartScheduler")
            .field("cfg", &self.cfg)
            .field("factory", &self.factory.name())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Forwards interval ticks to the cycle worker without ever blocking on it.
fn spawn_tick_detector(
    period: Duration,
    tx: mpsc::Sender<u64>,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = 0u64;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    tick += 1;
                    match tx.try_send(tick) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            debug!(tick, "restart tick absorbed; previous tick still pending");
                        }
                        Err(TrySendError::Closed(_)) => break,
                    }
                }
            }
        }
    })
}
