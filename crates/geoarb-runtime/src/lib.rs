//! GEOARB Runtime - Arbitration stream and sensor lifecycle
//!
//! This crate turns the synchronous arbiter into a live stream:
//! 1. Observers subscribe; the first one opens the activation gate
//! 2. The bootstrap sample is resolved from cached fixes and emitted
//! 3. Both sensors are subscribed through the platform location service
//! 4. Each sensor update is queued to a single processing task
//! 5. The processing task updates source state and runs the arbiter
//! 6. The winning sample is fanned out to every observer, in arrival order
//! 7. When the last observer leaves, the sensors are stopped after a delay

pub mod config;
pub mod gate;
pub mod lifecycle;
pub mod logging;
pub mod service;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use config::*;
pub use gate::*;
pub use lifecycle::*;
pub use logging::*;
pub use service::*;
pub use stream::*;
