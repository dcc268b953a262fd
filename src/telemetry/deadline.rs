//! Deadline breakdown into days, hours, minutes and seconds.

use std::fmt;

/// A deadline (seconds) split into whole days, hours, minutes and seconds.
///
/// Renders as `"{d}d {h}h {m}m {s}s"`.
///
/// ```rust
/// use minervisor::DeadlineTime;
///
/// let t = DeadlineTime::from_secs(90_061);
/// assert_eq!(t.to_string(), "1d 1h 1m 1s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineTime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DeadlineTime {
    pub fn from_secs(total: u64) -> Self {
        let minutes = total / 60;
        let hours = minutes / 60;
        Self {
            days: hours / 24,
            hours: hours % 24,
            minutes: minutes % 60,
            seconds: total % 60,
        }
    }

    /// Total number of seconds represented.
    pub fn as_secs(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for DeadlineTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {}h {}m {}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        let t = DeadlineTime::from_secs(0);
        assert_eq!(
            t,
            DeadlineTime {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0
            }
        );
        assert_eq!(t.to_string(), "0d 0h 0m 0s");
    }

    #[test]
    fn test_one_of_each() {
        assert_eq!(DeadlineTime::from_secs(90_061).to_string(), "1d 1h 1m 1s");
    }

    #[test]
    fn test_field_ranges() {
        let t = DeadlineTime::from_secs(86_399);
        assert_eq!((t.days, t.hours, t.minutes, t.seconds), (0, 23, 59, 59));
    }

    #[test]
    fn test_reconstruction() {
        let mut s: u64 = 0;
        while s < 10_000_000 {
            let t = DeadlineTime::from_secs(s);
            assert_eq!(t.as_secs(), s, "reconstruction failed for {s}");
            assert!(t.hours < 24 && t.minutes < 60 && t.seconds < 60);
            s = s * 3 + 7;
        }
        let big = u64::MAX / 2;
        assert_eq!(DeadlineTime::from_secs(big).as_secs(), big);
    }
}
