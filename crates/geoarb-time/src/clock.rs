//! Clock implementations for GEOARB

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use geoarb_core::ArrivalTime;

/// Source of arrival timestamps
/// INVARIANT: successive calls to `now` never go backwards
pub trait Clock: Send + Sync {
    fn now(&self) -> ArrivalTime;
}

/// Monotonic clock backed by the OS
pub struct MonotonicClock {
    /// Epoch of this clock
    reference: Instant,
}

impl MonotonicClock {
    /// Create a clock whose epoch is the moment of construction
    pub fn new() -> Self {
        MonotonicClock {
            reference: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> ArrivalTime {
        ArrivalTime::from_micros(self.reference.elapsed().as_micros() as u64)
    }
}

/// Manually driven clock
///
/// Clones share the same underlying time, so a test can hold one handle and
/// give another to the stream under test.
#[derive(Clone, Default)]
pub struct ManualClock {
    value: Arc<Mutex<ArrivalTime>>,
}

impl ManualClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::starting_at(ArrivalTime::ZERO)
    }

    pub fn starting_at(start: ArrivalTime) -> Self {
        ManualClock {
            value: Arc::new(Mutex::new(start)),
        }
    }

    /// Move time forward, returning the new value
    pub fn advance(&self, dt: Duration) -> ArrivalTime {
        let mut value = self.value.lock();
        *value = value.saturating_add(dt);
        *value
    }

    /// Jump to `target`
    /// Only allowed to move forward
    pub fn set(&self, target: ArrivalTime) {
        let mut value = self.value.lock();
        if target > *value {
            *value = target;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> ArrivalTime {
        *self.value.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();

        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = clock.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(10));
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let observer = clock.clone();

        clock.advance(Duration::from_secs(31));
        assert_eq!(observer.now(), ArrivalTime::from_secs(31));
    }

    #[test]
    fn test_manual_clock_never_rewinds() {
        let clock = ManualClock::starting_at(ArrivalTime::from_secs(10));

        clock.set(ArrivalTime::from_secs(5));
        assert_eq!(clock.now(), ArrivalTime::from_secs(10));

        clock.set(ArrivalTime::from_secs(12));
        assert_eq!(clock.now(), ArrivalTime::from_secs(12));
    }

    #[test]
    fn test_clock_as_trait_object() {
        let manual = ManualClock::new();
        let clock: Arc<dyn Clock> = Arc::new(manual.clone());

        manual.advance(Duration::from_millis(250));
        assert_eq!(clock.now().as_millis(), 250);
    }
}
