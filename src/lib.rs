//! # minervisor
//!
//! **Minervisor** keeps a proof-of-capacity mining engine running for days:
//! it restarts the engine on a fixed interval without ever cutting a mining
//! round short, and turns the engine's events into concise operator log lines.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 ┌───────────────────────────────────────────┐
//!                 │  RestartScheduler                         │
//!                 │  - tick detector (restart_interval)       │
//!                 │  - serialized restart cycles              │
//!                 │  - EngineFactory (one build per cycle)    │
//!                 └──────┬──────────────────────────────┬─────┘
//!                        │ build / start / stop / destroy│ drain: wait for
//!                        ▼                               │ round_finished
//!     ┌──────────────────────────────────────┐           │
//!     │  EngineInstance (one generation)     │           │
//!     │  Network   Round   Reader            │           │
//!     └──┬─────────────┬────────────┬────────┘           │
//!        │ Publishes   │ Publishes  │ Publishes          │
//!        │ - StateChg  │ - Started  │ - Progress         │
//!        │ - Winner    │ - Finished │ - CorruptFile      │
//!        │ - Confirmed │ - Result   │                    │
//!        ▼             ▼            ▼                    │
//! ┌───────────────────────────────────────────────────┐  │
//! │              Bus (broadcast, per generation)      │  │
//! └──────┬──────────────────────────┬─────────────────┘  │
//!        │ inline, publishing       ▼                    │
//!        │ thread, lossless  ┌───────────────┐           │
//!        │                   │  dispatcher   │           │
//!        ▼                   └───────┬───────┘           │
//! EventTelemetryBridge               ▼                   │
//!        │                   SubscriberSet (per-sub      │
//!        │                   queues, user subscribers)   │
//!        ▼                                               │
//!  SupervisorState ◄─────────────────────────────────────┘
//!  (round_finished, block, progress step)
//! ```
//!
//! ### Restart cycle
//! ```text
//! tick ──► stop timers (network, round)
//!      ──► wait until round_finished (signal or poll, no timeout)
//!      ──► reset progress_log_step
//!      ──► destroy engine, flush its dispatcher
//!      ──► build fresh engine + bus + bridge ──► banner ──► start_mining()
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                          |
//! |-------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Scheduling**    | Periodic drain-safe restarts, graceful shutdown.           | [`RestartScheduler`], [`SchedulerBuilder`]  |
//! | **Engine**        | Collaborator contracts and construction.                   | [`Network`], [`Round`], [`Reader`], [`EngineFactory`] |
//! | **Events**        | Typed collaborator events on a broadcast bus.              | [`DomainEvent`], [`Event`], [`Bus`]         |
//! | **Telemetry**     | Operator lines, progress gating, deadline breakdown.       | [`EventTelemetryBridge`], [`DeadlineTime`]  |
//! | **Subscriber API**| Extra observers attached to every generation.              | [`Subscribe`]                               |
//! | **Errors**        | Typed errors for scheduling, construction and config.      | [`RuntimeError`], [`EngineError`], [`ConfigError`] |
//! | **Configuration** | Runtime settings, TOML file form.                          | [`Config`], [`FileConfig`]                  |
//!
//! ## Example
//! ```rust,no_run
//! use minervisor::{Config, EngineContext, EngineError, EngineInstance, FactoryFn, RestartScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     minervisor::init_logging("info")?;
//!     let cfg = Config::from_toml_str("restart_interval_minutes = 120")?;
//!
//!     let factory = FactoryFn::arc("engine", |ctx: EngineContext| async move {
//!         // wire Network/Round/Reader with `ctx.bus` here
//!         let _ = ctx;
//!         Err::<EngineInstance, _>(EngineError::Unavailable { resource: "plots".into() })
//!     });
//!
//!     RestartScheduler::builder(cfg, factory)
//!         .build()?
//!         .run_until_signal()
//!         .await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod engine;
mod error;
mod events;
mod logging;
mod subscribers;
pub mod telemetry;

// ---- Public re-exports ----

pub use config::{Config, FileConfig};
pub use crate::core::{RestartScheduler, SchedulerBuilder, StateSnapshot, SupervisorState};
pub use engine::{
    Collaborator, EngineContext, EngineFactory, EngineInstance, FactoryFn, FactoryRef, Network,
    Reader, Round,
};
pub use error::{ConfigError, EngineError, RuntimeError};
pub use events::{Bus, DevPoolResult, DomainEvent, Event, InlineHandler, NO_DEADLINE};
pub use logging::init_logging;
pub use subscribers::{Subscribe, SubscriberSet};
pub use telemetry::{
    DeadlineTime, EventTelemetryBridge, LineLevel, ProgressReport, ProgressSample, TelemetryLine,
};
