//! # Engine construction.
//!
//! The scheduler builds a fresh [`EngineInstance`] on every restart through an
//! [`EngineFactory`]. [`FactoryFn`] wraps a closure `F: Fn(EngineContext) -> Fut`,
//! producing a fresh future per build.
//!
//! ## Example
//! ```rust
//! use minervisor::{EngineContext, EngineError, FactoryFn, FactoryRef};
//!
//! let factory: FactoryRef = FactoryFn::arc("miner", |ctx: EngineContext| async move {
//!     let _bus = ctx.bus; // hand this to the collaborators
//!     Err::<minervisor::EngineInstance, _>(EngineError::Unavailable {
//!         resource: "pool".into(),
//!     })
//! });
//!
//! assert_eq!(factory.name(), "miner");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::instance::EngineInstance;
use crate::error::EngineError;
use crate::events::Bus;

/// Inputs handed to the factory for one generation.
#[derive(Debug, Clone)]
pub struct EngineContext {
    /// Bus the collaborators publish their events on.
    pub bus: Bus,
    /// Generation counter (1 = first engine).
    pub generation: u64,
}

/// Builds engine instances.
#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    /// Returns a stable, human-readable factory name.
    fn name(&self) -> &str;

    /// Constructs a new, not yet started, engine instance.
    async fn build(&self, ctx: EngineContext) -> Result<EngineInstance, EngineError>;
}

/// Shared handle to a factory.
pub type FactoryRef = Arc<dyn EngineFactory>;

/// Function-backed factory.
#[derive(Debug)]
pub struct FactoryFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FactoryFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the factory and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> EngineFactory for FactoryFn<F>
where
    F: Fn(EngineContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<EngineInstance, EngineError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn build(&self, ctx: EngineContext) -> Result<EngineInstance, EngineError> {
        (self.f)(ctx).await
    }
}
