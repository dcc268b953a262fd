//! Error types used by the restart scheduler and its collaborators.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`]: errors raised by the scheduler itself.
//! - [`EngineError`]: errors raised by an [`EngineFactory`](crate::EngineFactory) while building an engine.
//! - [`ConfigError`]: errors raised while loading or validating [`Config`](crate::Config).
//!
//! Each type provides `as_label` for logs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the restart scheduler.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A fresh engine could not be constructed. There is no fallback and no retry.
    #[error("engine generation {generation} could not be built: {source}")]
    EngineBuild {
        /// Generation that failed (1 = first engine).
        generation: u64,
        /// Error reported by the factory.
        #[source]
        source: EngineError,
    },

    /// The final drain on shutdown did not finish within the grace period.
    #[error("shutdown grace {grace:?} exceeded while waiting for the round to finish")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// Global log subscriber could not be installed.
    #[error("logging setup failed: {reason}")]
    Logging {
        /// Underlying error message.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use minervisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::EngineBuild { .. } => "runtime_engine_build",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Logging { .. } => "runtime_logging",
        }
    }

    /// Whether the scheduler cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::EngineBuild { .. })
    }
}

/// # Errors produced while building an engine instance.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// Construction of one of the collaborators failed.
    #[error("build failed: {error}")]
    Build {
        /// The underlying error message.
        error: String,
    },

    /// A required external resource (pool, node, plot directory) is unavailable.
    #[error("resource unavailable: {resource}")]
    Unavailable {
        /// Name of the missing resource.
        resource: String,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::Build { .. } => "engine_build",
            EngineError::Unavailable { .. } => "engine_unavailable",
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has wrong field types.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the scheduler cannot work with.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_build_is_fatal() {
        let err = RuntimeError::EngineBuild {
            generation: 2,
            source: EngineError::Unavailable {
                resource: "pool".into(),
            },
        };
        assert!(err.is_fatal());
        assert_eq!(err.as_label(), "runtime_engine_build");
        assert_eq!(
            err.to_string(),
            "engine generation 2 could not be built: resource unavailable: pool"
        );
    }

    #[test]
    fn test_grace_is_not_fatal() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
        };
        assert!(!err.is_fatal());
    }
}
