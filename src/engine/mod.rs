//! # Engine abstractions.
//!
//! - [`Network`], [`Round`], [`Reader`] - collaborator contracts
//! - [`EngineInstance`] - one live generation of collaborators
//! - [`EngineFactory`], [`FactoryFn`], [`FactoryRef`] - how the scheduler gets a fresh instance

mod collaborator;
mod factory;
mod instance;

pub use collaborator::{Collaborator, Network, Reader, Round};
pub use factory::{EngineContext, EngineFactory, FactoryFn, FactoryRef};
pub use instance::EngineInstance;
