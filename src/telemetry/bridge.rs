//! # EventTelemetryBridge: domain events to operator log lines.
//!
//! Every engine generation gets a fresh bridge installed as the [`InlineHandler`]
//! of its bus, so each event is applied on the publishing thread before
//! `publish()` returns. For each [`DomainEvent`] it applies the supervisory
//! state mutation (if any) and renders the operator-facing lines. It also
//! implements [`Subscribe`] for use behind a `SubscriberSet`.
//!
//! ## Event table
//! ```text
//! RoundStarted            → begin_round()               → START block ... / targetDeadline ...
//! RoundFinished           → finish_round()              → FINISH block ...
//! NetworkStateChange      → set_current_block_number()  → (silent)
//! ReaderProgressChanged   → record_progress()           → NN% done (...)   (gated)
//! NetworkLastWinner       → (read current block)        → winner block ... | error if outdated
//! everything else         → (no mutation)               → one or more info/warn lines
//! ```
//!
//! ## Rules
//! - [`EventTelemetryBridge::apply`] is synchronous and takes `&self`, so it may be
//!   called from any producer thread as well as from the subscriber worker.
//! - Line texts are stable; downstream tooling parses them.
//! - Deadlines equal to [`NO_DEADLINE`] render as `N/A`.
//! - A detached bridge ignores delivered events: producers of a destroyed
//!   generation can no longer touch the state.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::core::SupervisorState;
use crate::events::{DevPoolResult, DomainEvent, Event, InlineHandler, NO_DEADLINE};
use crate::subscribers::Subscribe;
use crate::telemetry::deadline::DeadlineTime;
use crate::telemetry::progress::ProgressSample;

const GIB: u64 = 1024 * 1024 * 1024;

const ROUND_SEPARATOR: &str = "-------------------------------------------------------";

/// Severity of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Info,
    Warn,
    Error,
}

/// One operator-facing log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryLine {
    pub level: LineLevel,
    pub message: String,
}

impl TelemetryLine {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Info,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Warn,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Error,
            message: message.into(),
        }
    }

    /// Writes the line to the `tracing` sink.
    pub fn log(&self) {
        match self.level {
            LineLevel::Info => info!("{}", self.message),
            LineLevel::Warn => warn!("{}", self.message),
            LineLevel::Error => error!("{}", self.message),
        }
    }
}

/// Renders a deadline, mapping the sentinel to `N/A`.
fn deadline_or_na(deadline: u64) -> String {
    if deadline == NO_DEADLINE {
        "N/A".to_string()
    } else {
        deadline.to_string()
    }
}

/// Translates domain events into state updates and log lines.
#[derive(Debug)]
pub struct EventTelemetryBridge {
    state: Arc<SupervisorState>,
    attached: AtomicBool,
}

impl EventTelemetryBridge {
    pub fn new(state: Arc<SupervisorState>) -> Self {
        Self {
            state,
            attached: AtomicBool::new(true),
        }
    }

    /// Stops applying delivered events. Called when the generation is torn down.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Applies and logs one delivered event, unless detached.
    fn deliver(&self, ev: &Event) {
        if !self.is_attached() {
            debug!(seq = ev.seq, kind = ev.kind.label(), "event after detach ignored");
            return;
        }
        for line in self.apply(&ev.kind) {
            line.log();
        }
    }

    /// Applies `event` to the supervisory state and returns the lines to log.
    pub fn apply(&self, event: &DomainEvent) -> Vec<TelemetryLine> {
        match event {
            DomainEvent::RoundStarted {
                block_number,
                scoop_number,
                capacity_bytes,
                target_deadline,
                base_target,
            } => self.on_round_started(
                *block_number,
                *scoop_number,
                *capacity_bytes,
                *target_deadline,
                *base_target,
            ),
            DomainEvent::RoundFinished {
                block_number,
                round_duration_ms,
                best_committed_deadline,
            } => self.on_round_finished(*block_number, *round_duration_ms, *best_committed_deadline),
            DomainEvent::RoundSingleResult {
                deadline,
                is_pool_mining,
            } => {
                let mode = if *is_pool_mining { "pool" } else { "solo" };
                vec![TelemetryLine::info(format!("dl '{deadline}' send ({mode})"))]
            }
            DomainEvent::RoundSingleResultSkipped {
                deadline,
                target_deadline,
            } => vec![TelemetryLine::info(format!(
                "dl '{deadline}' > '{target_deadline}' skipped"
            ))],
            DomainEvent::NetworkStateChange { block_number } => {
                self.state.set_current_block_number(*block_number);
                Vec::new()
            }
            DomainEvent::NetworkLastWinner {
                last_block_number,
                winner_id,
            } => self.on_last_winner(*last_block_number, winner_id),
            DomainEvent::NetworkResultConfirmed { deadline } => {
                vec![TelemetryLine::info(format!(
                    "dl '{deadline}' confirmed!  [ {} ]",
                    DeadlineTime::from_secs(*deadline)
                ))]
            }
            DomainEvent::NetworkDevResultConfirmed {
                response,
                block_number,
                results,
            } => Self::on_dev_results(response, *block_number, results),
            DomainEvent::NetworkResultError {
                strange_deadline,
                calculated_deadline,
                block_number,
                nonce,
            } => vec![TelemetryLine::info(format!(
                "strange dl result '{strange_deadline}', calculated '{calculated_deadline}' \
                 block '{block_number}' nonce '{nonce}'"
            ))],
            DomainEvent::ReaderProgressChanged {
                capacity_bytes,
                remaining_capacity_bytes,
                elapsed_time_ms,
            } => {
                let sample = ProgressSample {
                    capacity_bytes: *capacity_bytes,
                    remaining_capacity_bytes: *remaining_capacity_bytes,
                    elapsed_time_ms: *elapsed_time_ms,
                };
                self.state
                    .record_progress(&sample)
                    .map(|report| vec![TelemetryLine::info(report.to_string())])
                    .unwrap_or_default()
            }
            DomainEvent::ReaderCorruptFile {
                file_path,
                number_of_chunks,
                number_of_parts,
                block_number,
            } => Self::on_corrupt_file(file_path, *number_of_chunks, *number_of_parts, *block_number),
        }
    }

    fn on_round_started(
        &self,
        block_number: u64,
        scoop_number: u32,
        capacity_bytes: u64,
        target_deadline: u64,
        base_target: u64,
    ) -> Vec<TelemetryLine> {
        self.state.begin_round();

        vec![
            TelemetryLine::info(ROUND_SEPARATOR),
            TelemetryLine::info(format!(
                "START block '{block_number}', scoopNumber '{scoop_number}', capacity '{} GB'",
                capacity_bytes / GIB
            )),
            TelemetryLine::info(format!(
                "      targetDeadline '{}', baseTarget '{base_target}'",
                deadline_or_na(target_deadline)
            )),
        ]
    }

    fn on_round_finished(
        &self,
        block_number: u64,
        round_duration_ms: u64,
        best_committed_deadline: u64,
    ) -> Vec<TelemetryLine> {
        self.state.finish_round();

        let s = round_duration_ms / 1000;
        let ms = round_duration_ms % 1000;
        vec![TelemetryLine::info(format!(
            "FINISH block '{block_number}', best deadline '{}', round time '{s}s {ms}ms'",
            deadline_or_na(best_committed_deadline)
        ))]
    }

    /// Winner info is only trusted for the block right before the current one.
    fn on_last_winner(&self, last_block_number: u64, winner_id: &str) -> Vec<TelemetryLine> {
        let current = self.state.current_block_number();
        if current.checked_sub(1) == Some(last_block_number) {
            vec![TelemetryLine::info(format!(
                "      winner block '{last_block_number}', '{winner_id}'"
            ))]
        } else {
            vec![TelemetryLine::error(format!(
                "Error: NetworkLastWinnerEvent for block: {last_block_number} is outdated!"
            ))]
        }
    }

    fn on_dev_results(
        response: &str,
        block_number: u64,
        results: &[DevPoolResult],
    ) -> Vec<TelemetryLine> {
        let mut lines = Vec::with_capacity(results.len() + 1);
        lines.push(TelemetryLine::info(format!(
            "devPool response '{response}', block '{block_number}'"
        )));
        lines.extend(results.iter().map(|r| {
            TelemetryLine::info(format!(
                "dl '{}' successful committed!  [ {} ]",
                r.deadline,
                DeadlineTime::from_secs(r.deadline)
            ))
        }));
        lines
    }

    fn on_corrupt_file(
        file_path: &Path,
        number_of_chunks: u64,
        number_of_parts: u64,
        block_number: u64,
    ) -> Vec<TelemetryLine> {
        vec![
            TelemetryLine::warn(format!(
                "strange dl source '{}' (try replotting!?)",
                file_path.display()
            )),
            TelemetryLine::warn(format!(
                "strange dl file chunks '{number_of_chunks}', parts per chunk '{number_of_parts}', \
                 block '{block_number}'"
            )),
        ]
    }
}

impl InlineHandler for EventTelemetryBridge {
    fn handle(&self, event: &Event) {
        self.deliver(event);
    }
}

#[async_trait]
impl Subscribe for EventTelemetryBridge {
    async fn on_event(&self, ev: &Event) {
        self.deliver(ev);
    }

    fn name(&self) -> &'static str {
        "telemetry-bridge"
    }
}
