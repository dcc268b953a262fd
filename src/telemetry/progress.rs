//! # Reader progress telemetry.
//!
//! Turns raw `ReaderProgressChanged` samples into at most
//! `log_steps_per_round` progress lines per round.
//!
//! ## Gate
//! ```text
//! log_step_capacity = capacity / log_steps_per_round
//!
//! emit if remaining == 0                                   (completion)
//!      or remaining < log_step_capacity * progress_log_step (threshold crossed)
//!
//! on emit: progress_log_step -= 1   (threshold)
//!          progress_log_step  = 0   (completion)
//! ```
//! The last countdown slot belongs to the completion line: a threshold can only
//! fire while more than one slot is left, so a round that was reset always
//! reports `remaining == 0` exactly once.
//!
//! ## Figures
//! - percentage: `ceil(100 * done / capacity)`, capped at 100
//! - volume: whole TiB plus remaining GiB
//! - throughput: `((done / 4096) / elapsed_ms) * 1000 / 1024 / 1024` MB/s

use std::fmt;

/// Scan size unit used by the throughput figure.
const SCAN_UNIT_BYTES: u64 = 4096;

const GIB: u64 = 1024 * 1024 * 1024;
const TIB: u64 = GIB * 1024;

/// One `ReaderProgressChanged` sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub capacity_bytes: u64,
    pub remaining_capacity_bytes: u64,
    pub elapsed_time_ms: u64,
}

impl ProgressSample {
    /// Bytes already scanned this round.
    pub fn done_bytes(&self) -> u64 {
        self.capacity_bytes
            .saturating_sub(self.remaining_capacity_bytes)
    }
}

/// Figures for one emitted progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub percentage: u64,
    pub done_tib: u64,
    pub done_gib: u64,
    pub throughput_mb_per_sec: u64,
}

impl ProgressReport {
    /// Computes the figures for `sample` without consulting the gate.
    pub fn compute(sample: &ProgressSample) -> Self {
        let done = sample.done_bytes();

        let percentage = if sample.capacity_bytes == 0 {
            100
        } else {
            let scaled = u128::from(done) * 100;
            let pct = scaled.div_ceil(u128::from(sample.capacity_bytes));
            pct.min(100) as u64
        };

        let throughput_mb_per_sec = (done / SCAN_UNIT_BYTES)
            .checked_div(sample.elapsed_time_ms)
            .map(|per_ms| per_ms.saturating_mul(1000) / 1024 / 1024)
            .unwrap_or(0);

        Self {
            percentage,
            done_tib: done / TIB,
            done_gib: done / GIB % 1024,
            throughput_mb_per_sec,
        }
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}% done ({}TB {}GB), eff.read '{} MB/s'",
            self.percentage, self.done_tib, self.done_gib, self.throughput_mb_per_sec
        )
    }
}

/// Applies the countdown gate to `sample`.
///
/// Returns the report to log, decrementing `progress_log_step` when a line is due.
/// `log_steps_per_round` must be non-zero (enforced by config validation).
pub fn evaluate(
    sample: &ProgressSample,
    log_steps_per_round: u32,
    progress_log_step: &mut u32,
) -> Option<ProgressReport> {
    if *progress_log_step == 0 || log_steps_per_round == 0 {
        return None;
    }

    let remaining = sample.remaining_capacity_bytes;
    if remaining == 0 {
        *progress_log_step = 0;
        return Some(ProgressReport::compute(sample));
    }
    if *progress_log_step == 1 {
        return None;
    }

    let log_step_capacity = sample.capacity_bytes / u64::from(log_steps_per_round);
    if remaining < log_step_capacity.saturating_mul(u64::from(*progress_log_step)) {
        *progress_log_step -= 1;
        return Some(ProgressReport::compute(sample));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(capacity: u64, remaining: u64, elapsed_ms: u64) -> ProgressSample {
        ProgressSample {
            capacity_bytes: capacity,
            remaining_capacity_bytes: remaining,
            elapsed_time_ms: elapsed_ms,
        }
    }

    #[test]
    fn test_completion_reports_hundred_percent() {
        let mut step = 1;
        let report = evaluate(&sample(1_000_000_000_000, 0, 60_000), 10, &mut step)
            .expect("completion must emit");
        assert_eq!(report.percentage, 100);
        assert_eq!(step, 0);
    }

    #[test]
    fn test_bounded_lines_per_round() {
        let capacity = 1_000_000_000_000u64;
        let steps = 10;
        let mut step = steps;
        let mut emitted = Vec::new();

        for k in 1..=1000u64 {
            let remaining = capacity - capacity / 1000 * k;
            if let Some(r) = evaluate(&sample(capacity, remaining, k * 100), steps, &mut step) {
                emitted.push((remaining, r));
            }
        }

        assert_eq!(emitted.len(), steps as usize);
        let (last_remaining, last) = emitted.last().copied().unwrap();
        assert_eq!(last_remaining, 0);
        assert_eq!(last.percentage, 100);
        assert_eq!(step, 0);
    }

    #[test]
    fn test_repeated_completion_emits_once() {
        let mut step = 3;
        let s = sample(4096, 0, 10);
        assert!(evaluate(&s, 3, &mut step).is_some());
        assert_eq!(step, 0);
        assert!(evaluate(&s, 3, &mut step).is_none());
    }

    #[test]
    fn test_last_slot_is_reserved_for_completion() {
        let capacity = 1000;
        let mut step = 1;
        assert!(evaluate(&sample(capacity, 50, 10), 10, &mut step).is_none());
        assert_eq!(step, 1);
        assert!(evaluate(&sample(capacity, 0, 10), 10, &mut step).is_some());
    }

    #[test]
    fn test_below_threshold_is_silent() {
        let mut step = 10;
        // log_step_capacity = 100, threshold = 1000: remaining must drop below capacity.
        assert!(evaluate(&sample(1000, 1000, 10), 10, &mut step).is_none());
        assert_eq!(step, 10);
        assert!(evaluate(&sample(1000, 999, 10), 10, &mut step).is_some());
        assert_eq!(step, 9);
    }

    #[test]
    fn test_percentage_rounds_up() {
        let r = ProgressReport::compute(&sample(3, 2, 1));
        assert_eq!(r.percentage, 34);
        let r = ProgressReport::compute(&sample(0, 0, 1));
        assert_eq!(r.percentage, 100);
    }

    #[test]
    fn test_volume_split() {
        let done = 2 * TIB + 5 * GIB + 123;
        let r = ProgressReport::compute(&sample(done + GIB, GIB, 1));
        assert_eq!((r.done_tib, r.done_gib), (2, 5));
    }

    #[test]
    fn test_throughput_formula() {
        // 4096 * 1024 * 1024 bytes over 1000 ms: 1048 units/ms -> 1048000 / 1024 / 1024 = 0
        let r = ProgressReport::compute(&sample(4096 * 1024 * 1024, 0, 1000));
        assert_eq!(r.throughput_mb_per_sec, 0);

        // 4096 * 1024 * 1024 * 10 bytes over 1 ms: 10485760 units/ms -> 10_000 MB/s
        let r = ProgressReport::compute(&sample(4096 * 1024 * 1024 * 10, 0, 1));
        assert_eq!(r.throughput_mb_per_sec, 10_000);
    }

    #[test]
    fn test_zero_elapsed_has_no_throughput() {
        let r = ProgressReport::compute(&sample(TIB, 0, 0));
        assert_eq!(r.throughput_mb_per_sec, 0);
    }

    #[test]
    fn test_line_format() {
        let r = ProgressReport {
            percentage: 42,
            done_tib: 1,
            done_gib: 512,
            throughput_mb_per_sec: 97,
        };
        assert_eq!(r.to_string(), "42% done (1TB 512GB), eff.read '97 MB/s'");
    }
}
