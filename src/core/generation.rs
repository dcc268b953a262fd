//! # Generation: one engine instance plus its event dispatcher.
//!
//! ## Architecture
//! ```text
//! launch(n):
//!   bridge = EventTelemetryBridge(state)
//!   Bus::with_inline(cfg.bus_capacity, bridge)                          (state path, lossless)
//!   dispatcher = spawn( Bus.subscribe() ─► SubscriberSet[extra...] )   (attached first)
//!   EngineFactory::build(EngineContext { bus, n })                       (may fail → fatal)
//!
//! teardown():
//!   engine.destroy()             (timers stopped, collaborators released)
//!   bridge.detach()              → late events no longer touch the state
//!   stop.cancel()                → dispatcher drains what is buffered, then
//!   SubscriberSet::shutdown()    → workers finish their queues
//! ```
//!
//! ## Rules
//! - The bridge and the dispatcher are attached before the factory runs, so no
//!   early event is lost.
//! - State changes happen on the publishing thread; when a collaborator call
//!   returns, the events it published are already reflected in the state.
//! - The dispatcher exits on its own token, not on sender drop: collaborators may
//!   keep bus clones on threads that outlive `destroy()`.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::SupervisorState;
use crate::engine::{EngineContext, EngineFactory, EngineInstance};
use crate::error::EngineError;
use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::telemetry::EventTelemetryBridge;

/// A live engine instance and the task delivering its events.
pub(crate) struct Generation {
    number: u64,
    engine: EngineInstance,
    bridge: Arc<EventTelemetryBridge>,
    stop: CancellationToken,
    dispatcher: JoinHandle<()>,
}

impl Generation {
    /// Wires a fresh bridge and builds the engine. The engine is not started.
    pub(crate) async fn launch(
        number: u64,
        cfg: &Config,
        factory: &dyn EngineFactory,
        state: &Arc<SupervisorState>,
        extra: &[Arc<dyn Subscribe>],
    ) -> Result<Self, EngineError> {
        let bridge = Arc::new(EventTelemetryBridge::new(Arc::clone(state)));
        let bus = Bus::with_inline(cfg.bus_capacity_clamped(), bridge.clone());

        let stop = CancellationToken::new();
        let dispatcher = spawn_dispatcher(
            number,
            bus.subscribe(),
            SubscriberSet::new(extra.to_vec()),
            stop.clone(),
        );

        let ctx = EngineContext {
            bus,
            generation: number,
        };
        match factory.build(ctx).await {
            Ok(engine) => Ok(Self {
                number,
                engine,
                bridge,
                stop,
                dispatcher,
            }),
            Err(e) => {
                bridge.detach();
                stop.cancel();
                if let Err(join) = dispatcher.await {
                    warn!(generation = number, error = %join, "event dispatcher ended abnormally");
                }
                Err(e)
            }
        }
    }

    #[inline]
    pub(crate) fn number(&self) -> u64 {
        self.number
    }

    pub(crate) fn start(&self) {
        self.engine.start();
    }

    pub(crate) fn stop_timers(&mut self) {
        self.engine.stop_timers();
    }

    /// Destroys the engine and flushes every pending event to the subscribers.
    pub(crate) async fn teardown(self) {
        let Generation {
            number,
            engine,
            bridge,
            stop,
            dispatcher,
        } = self;

        engine.destroy();
        bridge.detach();
        stop.cancel();
        if let Err(e) = dispatcher.await {
            warn!(generation = number, error = %e, "event dispatcher ended abnormally");
        }
        debug!(generation = number, "generation torn down");
    }
}

/// Forwards bus events to the subscriber set until `stop` fires.
fn spawn_dispatcher(
    generation: u64,
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(generation, skipped, "event dispatcher lagged; events dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => set.emit(&ev),
                            Err(TryRecvError::Lagged(skipped)) => {
                                warn!(generation, skipped, "event dispatcher lagged; events dropped");
                            }
                            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                        }
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Collaborator, FactoryFn, Network, Reader, Round};
    use crate::events::DomainEvent;
    use parking_lot::Mutex;

    struct Silent;
    impl Collaborator for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }
    impl Network for Silent {
        fn start_mining(&self) {}
        fn stop_timer(&self) {}
    }
    impl Round for Silent {
        fn stop_timer(&self) {}
    }
    impl Reader for Silent {}

    #[tokio::test]
    async fn test_events_published_during_build_reach_the_bridge() {
        let state = Arc::new(SupervisorState::new(5));
        let leaked: Arc<Mutex<Option<Bus>>> = Arc::default();
        let keep = Arc::clone(&leaked);

        let factory = FactoryFn::new("eager", move |ctx: EngineContext| {
            let keep = Arc::clone(&keep);
            async move {
                ctx.bus.emit(DomainEvent::NetworkStateChange { block_number: 77 });
                // a producer thread that outlives the engine
                *keep.lock() = Some(ctx.bus.clone());
                Ok::<_, EngineError>(EngineInstance::new(
                    Box::new(Silent),
                    Box::new(Silent),
                    Box::new(Silent),
                ))
            }
        });

        let mut generation = Generation::launch(1, &Config::default(), &factory, &state, &[])
            .await
            .unwrap();
        generation.stop_timers();
        generation.teardown().await;

        assert_eq!(state.current_block_number(), 77);

        // a producer thread that outlived the engine
        let late = leaked.lock().take().unwrap();
        std::thread::spawn(move || {
            late.emit(DomainEvent::NetworkStateChange { block_number: 78 });
            late.emit(DomainEvent::RoundStarted {
                block_number: 78,
                scoop_number: 1,
                capacity_bytes: 1,
                target_deadline: 1,
                base_target: 1,
            });
        })
        .join()
        .unwrap();
        assert_eq!(state.current_block_number(), 77);
        assert!(state.is_round_finished());
    }

    #[tokio::test]
    async fn test_state_follows_publish_without_waiting() {
        let state = Arc::new(SupervisorState::new(5));
        let leaked: Arc<Mutex<Option<Bus>>> = Arc::default();
        let keep = Arc::clone(&leaked);
        let cfg = Config {
            bus_capacity: 16,
            ..Config::default()
        };

        let factory = FactoryFn::new("flood", move |ctx: EngineContext| {
            let keep = Arc::clone(&keep);
            async move {
                *keep.lock() = Some(ctx.bus);
                Ok::<_, EngineError>(EngineInstance::new(
                    Box::new(Silent),
                    Box::new(Silent),
                    Box::new(Silent),
                ))
            }
        });
        let generation = Generation::launch(1, &cfg, &factory, &state, &[]).await.unwrap();
        let bus = leaked.lock().clone().unwrap();

        bus.emit(DomainEvent::NetworkStateChange { block_number: 5 });
        bus.emit(DomainEvent::RoundStarted {
            block_number: 5,
            scoop_number: 2,
            capacity_bytes: 1 << 30,
            target_deadline: 100,
            base_target: 1,
        });
        for k in 0..1100u64 {
            bus.emit(DomainEvent::ReaderProgressChanged {
                capacity_bytes: 1 << 30,
                remaining_capacity_bytes: (1 << 30) - k,
                elapsed_time_ms: k,
            });
        }
        assert!(!state.is_round_finished());
        assert_eq!(state.current_block_number(), 5);

        bus.emit(DomainEvent::RoundFinished {
            block_number: 5,
            round_duration_ms: 1100,
            best_committed_deadline: 100,
        });
        assert!(state.is_round_finished());

        generation.teardown().await;
    }

    #[tokio::test]
    async fn test_failed_build_stops_dispatcher() {
        let state = Arc::new(SupervisorState::new(5));
        let factory = FactoryFn::new("broken", |_ctx: EngineContext| async {
            Err::<EngineInstance, _>(EngineError::Build {
                error: "no plots".into(),
            })
        });

        let res = Generation::launch(3, &Config::default(), &factory, &state, &[]).await;
        assert!(matches!(res, Err(EngineError::Build { .. })));
    }
}
