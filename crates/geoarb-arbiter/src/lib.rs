//! GEOARB Arbiter - Source tracking and selection policy
//!
//! This crate implements the synchronous arbitration core:
//! - Per-source state (latest sample, arrival time, validity, recency)
//! - The freshness/availability selection policy between precise and coarse
//! - Bootstrap resolution from cached last-known fixes
//!
//! Nothing here blocks, allocates per update, or touches a thread.

pub mod source;
pub mod arbiter;
pub mod bootstrap;

pub use source::*;
pub use arbiter::*;
pub use bootstrap::*;
