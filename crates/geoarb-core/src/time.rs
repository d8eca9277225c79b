//! Time primitives for GEOARB
//!
//! Two unrelated time axes are in play:
//! - Arrival time: monotonic, local, read when the core ingests an update
//! - Native time: the sensor's own fix timestamp, wall-clock based

use std::ops::{Add, Sub};
use std::time::Duration;

/// Window after which a source's last arrival no longer counts as recent
pub const RECENCY_WINDOW: Duration = Duration::from_secs(30);

/// Arrival time - monotonic, local-driven
/// Represented as microseconds since the clock's epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ArrivalTime(pub u64);

impl ArrivalTime {
    pub const ZERO: ArrivalTime = ArrivalTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        ArrivalTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        ArrivalTime(millis * 1000)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        ArrivalTime(secs * 1_000_000)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        ArrivalTime(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    #[inline]
    pub fn saturating_since(self, earlier: ArrivalTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for ArrivalTime {
    type Output = ArrivalTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<ArrivalTime> for ArrivalTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: ArrivalTime) -> Self::Output {
        self.saturating_since(rhs)
    }
}

impl std::fmt::Debug for ArrivalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "arrival({:.3}s)", self.0 as f64 / 1_000_000.0)
    }
}

/// Native fix timestamp reported by the sensor
/// Represented as milliseconds since the Unix epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NativeTimestamp(pub i64);

impl NativeTimestamp {
    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        NativeTimestamp(millis)
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }
}
