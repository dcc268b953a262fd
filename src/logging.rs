//! Global log subscriber setup.
//!
//! Operator lines are plain `tracing` events; any subscriber works. This helper
//! installs the usual fmt subscriber with an [`EnvFilter`]: `RUST_LOG` wins,
//! otherwise `directive` is used (for example `"info"` or `"info,minervisor=debug"`).

use tracing_subscriber::EnvFilter;

use crate::error::RuntimeError;

/// Installs a fmt subscriber as the global default.
///
/// Fails with [`RuntimeError::Logging`] when the directive does not parse or a
/// global subscriber is already set.
pub fn init_logging(directive: &str) -> Result<(), RuntimeError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive).map_err(|e| RuntimeError::Logging {
            reason: e.to_string(),
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| RuntimeError::Logging {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init_logging("info");
        let err = init_logging("info").unwrap_err();
        assert_eq!(err.as_label(), "runtime_logging");
    }
}
