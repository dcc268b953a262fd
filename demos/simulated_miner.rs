//! # Demo: simulated_miner
//!
//! Runs the restart scheduler against a simulated mining engine.
//!
//! Shows how to:
//! - Implement [`Network`], [`Round`] and [`Reader`] collaborators that publish on the [`Bus`].
//! - Build engines through a [`FactoryFn`].
//! - Attach an extra [`Subscribe`] next to the built-in telemetry bridge.
//! - Shut down on Ctrl-C with [`RestartScheduler::run_until_signal`].
//!
//! ## Flow
//! ```text
//! RestartScheduler ──► FactoryFn("simulated") ──► SimNetwork / SimRound / SimReader
//!     SimNetwork block timer (every --block-secs):
//!         NetworkStateChange, NetworkLastWinner
//!         spawn round: RoundStarted ─► ReaderProgressChanged x N ─► results ─► RoundFinished
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example simulated_miner -- --restart-minutes 1 --block-secs 20
//! cargo run --example simulated_miner -- --config miner.toml --log-level debug
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use minervisor::{
    Bus, Collaborator, Config, DevPoolResult, DomainEvent, EngineContext, EngineError,
    EngineInstance, Event, FactoryFn, NO_DEADLINE, Network, Reader, RestartScheduler, Round,
    Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const CAPACITY_BYTES: u64 = 6 * (1 << 40) + 300 * (1 << 30);
const PROGRESS_SAMPLES: u64 = 20;
const SCAN_STEP: Duration = Duration::from_millis(400);
const TARGET_DEADLINE: u64 = 80_000;

#[derive(Parser, Debug)]
#[command(name = "simulated_miner", about = "Supervised PoC miner simulation")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Override the restart interval (minutes)
    #[arg(long)]
    restart_minutes: Option<u64>,

    /// Seconds between simulated blocks
    #[arg(long, default_value_t = 30)]
    block_secs: u64,
}

/// Counts every event seen across all generations.
#[derive(Default)]
struct EventCounter {
    seen: AtomicU64,
}

#[async_trait::async_trait]
impl Subscribe for EventCounter {
    async fn on_event(&self, ev: &Event) {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(seq = ev.seq, kind = ev.kind.label(), seen, "event observed");
    }

    fn name(&self) -> &'static str {
        "event-counter"
    }
}

/// Shared timer switches of one simulated engine.
#[derive(Clone)]
struct Timers {
    network: CancellationToken,
    round: CancellationToken,
}

impl Timers {
    fn running(&self) -> bool {
        !self.network.is_cancelled() && !self.round.is_cancelled()
    }
}

struct SimNetwork {
    bus: Bus,
    timers: Timers,
    block: Arc<AtomicU64>,
    block_time: Duration,
}

impl Collaborator for SimNetwork {
    fn name(&self) -> &str {
        "sim-network"
    }

    fn release(&self) {
        debug!(block = self.block.load(Ordering::Relaxed), "network released");
    }
}

impl Network for SimNetwork {
    fn start_mining(&self) {
        let bus = self.bus.clone();
        let timers = self.timers.clone();
        let block = Arc::clone(&self.block);
        let block_time = self.block_time;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(block_time);
            loop {
                tokio::select! {
                    _ = timers.network.cancelled() => break,
                    _ = ticker.tick() => {
                        let number = block.fetch_add(1, Ordering::Relaxed) + 1;
                        bus.emit(DomainEvent::NetworkStateChange { block_number: number });
                        bus.emit(DomainEvent::NetworkLastWinner {
                            last_block_number: number - 1,
                            winner_id: Arc::from(format!("BURST-{:04X}", pseudo(number) & 0xFFFF)),
                        });
                        if timers.running() {
                            // a started round always runs to completion
                            tokio::spawn(simulate_round(bus.clone(), number));
                        }
                    }
                }
            }
        });
    }

    fn stop_timer(&self) {
        self.timers.network.cancel();
    }
}

struct SimRound {
    timers: Timers,
}

impl Collaborator for SimRound {
    fn name(&self) -> &str {
        "sim-round"
    }
}

impl Round for SimRound {
    fn stop_timer(&self) {
        self.timers.round.cancel();
    }
}

struct SimReader;

impl Collaborator for SimReader {
    fn name(&self) -> &str {
        "sim-reader"
    }
}

impl Reader for SimReader {}

async fn simulate_round(bus: Bus, block_number: u64) {
    let begin = Instant::now();
    bus.emit(DomainEvent::RoundStarted {
        block_number,
        scoop_number: (pseudo(block_number) % 4096) as u32,
        capacity_bytes: CAPACITY_BYTES,
        target_deadline: TARGET_DEADLINE,
        base_target: 50_000 + pseudo(block_number) % 10_000,
    });

    let mut best = NO_DEADLINE;
    for sample in 1..=PROGRESS_SAMPLES {
        tokio::time::sleep(SCAN_STEP).await;
        let remaining = CAPACITY_BYTES - CAPACITY_BYTES / PROGRESS_SAMPLES * sample;
        let remaining = if sample == PROGRESS_SAMPLES { 0 } else { remaining };
        bus.emit(DomainEvent::ReaderProgressChanged {
            capacity_bytes: CAPACITY_BYTES,
            remaining_capacity_bytes: remaining,
            elapsed_time_ms: begin.elapsed().as_millis() as u64,
        });

        if sample % 7 == 0 {
            let deadline = pseudo(block_number ^ sample) % 200_000;
            if deadline > TARGET_DEADLINE {
                bus.emit(DomainEvent::RoundSingleResultSkipped {
                    deadline,
                    target_deadline: TARGET_DEADLINE,
                });
            } else {
                bus.emit(DomainEvent::RoundSingleResult {
                    deadline,
                    is_pool_mining: true,
                });
                bus.emit(DomainEvent::NetworkResultConfirmed { deadline });
                best = best.min(deadline);
            }
        }
    }

    if block_number % 5 == 0 {
        bus.emit(DomainEvent::NetworkDevResultConfirmed {
            response: Arc::from("OK"),
            block_number,
            results: vec![DevPoolResult {
                deadline: pseudo(block_number) % 50_000,
            }],
        });
    }
    if block_number % 11 == 0 {
        bus.emit(DomainEvent::ReaderCorruptFile {
            file_path: PathBuf::from(format!("/plots/1234_{block_number}_8192_8192")),
            number_of_chunks: 4,
            number_of_parts: 8,
            block_number,
        });
    }

    bus.emit(DomainEvent::RoundFinished {
        block_number,
        round_duration_ms: begin.elapsed().as_millis() as u64,
        best_committed_deadline: best,
    });
}

fn pseudo(seed: u64) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(17)
}

fn build_engine(ctx: EngineContext, block_time: Duration, first_block: u64) -> EngineInstance {
    let timers = Timers {
        network: CancellationToken::new(),
        round: CancellationToken::new(),
    };
    info!(generation = ctx.generation, "simulated engine assembled");
    EngineInstance::new(
        Box::new(SimNetwork {
            bus: ctx.bus,
            timers: timers.clone(),
            block: Arc::new(AtomicU64::new(first_block)),
            block_time,
        }),
        Box::new(SimRound { timers }),
        Box::new(SimReader),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    minervisor::init_logging(&cli.log_level)?;

    let mut cfg = match &cli.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(minutes) = cli.restart_minutes {
        cfg.restart_interval = Duration::from_secs(minutes * 60);
    }

    let block_time = Duration::from_secs(cli.block_secs.max(1));
    let height = Arc::new(AtomicU64::new(500_000));
    let factory = FactoryFn::arc("simulated", move |ctx: EngineContext| {
        let first_block = height.fetch_add(1_000, Ordering::Relaxed);
        async move { Ok::<_, EngineError>(build_engine(ctx, block_time, first_block)) }
    });

    let counter = Arc::new(EventCounter::default());
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![counter.clone()];
    let scheduler = RestartScheduler::builder(cfg, factory)
        .with_subscribers(subscribers)
        .build()?;

    scheduler.run_until_signal().await?;
    info!(
        events = counter.seen.load(Ordering::Relaxed),
        "simulated miner stopped"
    );
    Ok(())
}
