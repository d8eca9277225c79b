//! GEOARB Test Harness - Simulation and scenario validation
//!
//! This crate provides:
//! - A simulated platform location service with failure injection
//! - Seeded sensor feeds (open sky, urban, indoor, tunnel outages)
//! - A scenario runner driving a real stream on simulated time
//! - End-to-end walkthroughs of the stream's observable behaviour

pub mod service;
pub mod sensor;
pub mod scenario;
pub mod integration;

pub use service::*;
pub use sensor::*;
pub use scenario::*;
pub use integration::*;
