//! # EngineInstance: one generation of the collaborator ensemble.
//!
//! ## Lifecycle
//! ```text
//! EngineFactory::build() ──► EngineInstance
//!                               │ start()         → network.start_mining()
//!                               │ stop_timers()   → network.stop_timer(), round.stop_timer()
//!                               │ (drain: wait for RoundFinished)
//!                               └ destroy()       → release reader, round, network; drop
//! ```
//!
//! ## Rules
//! - Exactly one instance is live at a time (owned by the scheduler).
//! - `stop_timers()` always precedes `destroy()`; `destroy()` consumes the instance.

use tracing::debug;

use super::collaborator::{Network, Reader, Round};

/// The live collaborator ensemble for one generation.
pub struct EngineInstance {
    network: Box<dyn Network>,
    round: Box<dyn Round>,
    reader: Box<dyn Reader>,
    timers_stopped: bool,
}

impl EngineInstance {
    pub fn new(network: Box<dyn Network>, round: Box<dyn Round>, reader: Box<dyn Reader>) -> Self {
        Self {
            network,
            round,
            reader,
            timers_stopped: false,
        }
    }

    /// Starts mining.
    pub fn start(&self) {
        debug!(network = self.network.name(), "start mining");
        self.network.start_mining();
    }

    /// Stops network and round timers so no new round begins.
    ///
    /// Idempotent: collaborators see at most one `stop_timer` call each.
    pub fn stop_timers(&mut self) {
        if self.timers_stopped {
            return;
        }
        self.network.stop_timer();
        self.round.stop_timer();
        self.timers_stopped = true;
    }

    pub fn timers_stopped(&self) -> bool {
        self.timers_stopped
    }

    /// Tears the instance down, releasing every collaborator.
    pub fn destroy(mut self) {
        self.stop_timers();
        self.reader.release();
        self.round.release();
        self.network.release();
        debug!(
            network = self.network.name(),
            round = self.round.name(),
            reader = self.reader.name(),
            "engine instance released"
        );
    }
}

impl std::fmt::Debug for EngineInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineInstance")
            .field("network", &self.network.name())
            .field("round", &self.round.name())
            .field("reader", &self.reader.name())
            .field("timers_stopped", &self.timers_stopped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collaborator::Collaborator;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Part {
        name: &'static str,
        journal: Journal,
    }

    impl Part {
        fn boxed(name: &'static str, journal: &Journal) -> Box<Self> {
            Box::new(Self {
                name,
                journal: Arc::clone(journal),
            })
        }
        fn note(&self, what: &str) {
            self.journal.lock().push(format!("{}.{what}", self.name));
        }
    }

    impl Collaborator for Part {
        fn name(&self) -> &str {
            self.name
        }
        fn release(&self) {
            self.note("release");
        }
    }
    impl Network for Part {
        fn start_mining(&self) {
            self.note("start_mining");
        }
        fn stop_timer(&self) {
            self.note("stop_timer");
        }
    }
    impl Round for Part {
        fn stop_timer(&self) {
            self.note("stop_timer");
        }
    }
    impl Reader for Part {}

    fn instance(journal: &Journal) -> EngineInstance {
        EngineInstance::new(
            Part::boxed("network", journal),
            Part::boxed("round", journal),
            Part::boxed("reader", journal),
        )
    }

    #[test]
    fn test_stop_precedes_release() {
        let journal = Journal::default();
        let mut engine = instance(&journal);
        engine.start();
        assert!(!engine.timers_stopped());
        engine.stop_timers();
        assert!(engine.timers_stopped());
        engine.stop_timers();
        engine.destroy();

        assert_eq!(
            *journal.lock(),
            vec![
                "network.start_mining",
                "network.stop_timer",
                "round.stop_timer",
                "reader.release",
                "round.release",
                "network.release",
            ]
        );
    }

    #[test]
    fn test_destroy_stops_timers_if_needed() {
        let journal = Journal::default();
        instance(&journal).destroy();
        assert_eq!(journal.lock()[0], "network.stop_timer");
    }
}
