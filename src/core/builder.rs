use std::sync::Arc;

use super::scheduler::RestartScheduler;
use crate::{config::Config, engine::FactoryRef, error::ConfigError, subscribers::Subscribe};

/// Builder for constructing a [`RestartScheduler`].
pub struct SchedulerBuilder {
    cfg: Config,
    factory: FactoryRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration and engine factory.
    pub fn new(cfg: Config, factory: FactoryRef) -> Self {
        Self {
            cfg,
            factory,
            subscribers: Vec::new(),
        }
    }

    /// Sets extra event subscribers.
    ///
    /// Every generation attaches them next to its telemetry bridge; each one
    /// gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and returns the scheduler.
    pub fn build(self) -> Result<RestartScheduler, ConfigError> {
        self.cfg.validate()?;
        Ok(RestartScheduler::new_internal(
            self.cfg,
            self.factory,
            self.subscribers,
        ))
    }
}
