//! Runtime core: restart scheduling and lifecycle.
//!
//! The public API from this module is [`RestartScheduler`] (built through
//! [`SchedulerBuilder`]) and the shared [`SupervisorState`].
//!
//! Internal modules:
//! - [`scheduler`]: tick detector, serialized restart cycles, drain and shutdown;
//! - [`generation`]: one engine instance plus its event dispatcher;
//! - [`state`]: round bookkeeping shared with the telemetry bridge;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`builder`]: scheduler wiring.

mod builder;
mod generation;
mod scheduler;
mod shutdown;
mod state;

pub use builder::SchedulerBuilder;
pub use scheduler::RestartScheduler;
pub use state::{StateSnapshot, SupervisorState};
