//! GEOARB Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every layer of the arbitration stream:
//! - Identifiers (SourceId, Provenance, SampleId)
//! - Time primitives (ArrivalTime, NativeTimestamp)
//! - Position samples and arbitration results
//! - Error taxonomy

pub mod id;
pub mod time;
pub mod sample;
pub mod error;

pub use id::*;
pub use time::*;
pub use sample::*;
pub use error::*;
