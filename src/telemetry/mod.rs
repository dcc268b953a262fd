//! Operator telemetry: deadline breakdown, progress gating and the event bridge.
//!
//! - [`deadline`]: seconds → `{d}d {h}h {m}m {s}s`
//! - [`progress`]: bounded progress lines from reader samples
//! - [`bridge`]: [`EventTelemetryBridge`], the subscriber that ties both to [`SupervisorState`](crate::SupervisorState)

pub mod bridge;
pub mod deadline;
pub mod progress;

pub use bridge::{EventTelemetryBridge, LineLevel, TelemetryLine};
pub use deadline::DeadlineTime;
pub use progress::{ProgressReport, ProgressSample};
