//! GEOARB Time - Clock sources
//!
//! This crate provides the clocks the arbitration core reads arrival times from:
//! - MonotonicClock: real, OS-backed monotonic time
//! - ManualClock: explicitly advanced time for simulations and tests

pub mod clock;

pub use clock::*;
