//! Per-source state tracking

use std::time::Duration;

use geoarb_core::{ArrivalTime, PositionSample, SourceId};

/// Latest sample of a source together with the moment it arrived
#[derive(Clone, Copy, Debug, PartialEq)]
struct Arrival {
    sample: PositionSample,
    at: ArrivalTime,
}

/// Latest known value of one sensor source
///
/// The sample and its arrival time are stored together, so a state is either
/// fully empty or carries both.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceState {
    source: SourceId,
    last: Option<Arrival>,
}

impl SourceState {
    pub fn new(source: SourceId) -> Self {
        SourceState { source, last: None }
    }

    #[inline]
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Record a new sample that arrived at `now`
    pub fn update(&mut self, sample: PositionSample, now: ArrivalTime) {
        debug_assert_eq!(sample.provenance().source(), Some(self.source));
        self.last = Some(Arrival { sample, at: now });
    }

    /// True once any sample has been recorded
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.last.is_some()
    }

    /// True if valid and the last arrival is strictly younger than `window`
    #[inline]
    pub fn is_recent(&self, now: ArrivalTime, window: Duration) -> bool {
        match self.last {
            Some(arrival) => now.saturating_since(arrival.at) < window,
            None => false,
        }
    }

    #[inline]
    pub fn last_sample(&self) -> Option<&PositionSample> {
        self.last.as_ref().map(|arrival| &arrival.sample)
    }

    #[inline]
    pub fn last_arrival(&self) -> Option<ArrivalTime> {
        self.last.map(|arrival| arrival.at)
    }

    /// Time since the last arrival
    pub fn age(&self, now: ArrivalTime) -> Option<Duration> {
        self.last.map(|arrival| now.saturating_since(arrival.at))
    }
}

/// The two live source states, indexed by [`SourceId`]
#[derive(Clone, Debug, PartialEq)]
pub struct SourcePair {
    pub precise: SourceState,
    pub coarse: SourceState,
}

impl SourcePair {
    pub fn new() -> Self {
        SourcePair {
            precise: SourceState::new(SourceId::Precise),
            coarse: SourceState::new(SourceId::Coarse),
        }
    }

    pub fn get(&self, source: SourceId) -> &SourceState {
        match source {
            SourceId::Precise => &self.precise,
            SourceId::Coarse => &self.coarse,
        }
    }

    pub fn get_mut(&mut self, source: SourceId) -> &mut SourceState {
        match source {
            SourceId::Precise => &mut self.precise,
            SourceId::Coarse => &mut self.coarse,
        }
    }
}

impl Default for SourcePair {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoarb_core::{LocationFix, NativeTimestamp, RECENCY_WINDOW};
    use proptest::prelude::*;

    fn fix(lat: f64, lon: f64) -> LocationFix {
        LocationFix::new(lat, lon, NativeTimestamp::from_millis(0))
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = SourceState::new(SourceId::Precise);

        assert!(!state.is_valid());
        assert!(!state.is_recent(ArrivalTime::ZERO, RECENCY_WINDOW));
        assert!(state.last_sample().is_none());
        assert!(state.last_arrival().is_none());
        assert!(state.age(ArrivalTime::from_secs(5)).is_none());
    }

    #[test]
    fn test_update_records_sample_and_arrival() {
        let mut state = SourceState::new(SourceId::Coarse);
        let sample = PositionSample::live(SourceId::Coarse, &fix(52.5, 13.4));
        let now = ArrivalTime::from_secs(100);

        state.update(sample, now);

        assert!(state.is_valid());
        assert_eq!(state.last_sample(), Some(&sample));
        assert_eq!(state.last_arrival(), Some(now));
        assert_eq!(
            state.age(ArrivalTime::from_secs(104)),
            Some(Duration::from_secs(4))
        );
    }

    #[test]
    fn test_recency_window_is_exclusive() {
        let mut state = SourceState::new(SourceId::Precise);
        let arrived = ArrivalTime::from_secs(10);
        state.update(PositionSample::live(SourceId::Precise, &fix(0.5, 0.5)), arrived);

        let just_inside = ArrivalTime::from_micros(arrived.as_micros() + 29_999_999);
        assert!(state.is_recent(just_inside, RECENCY_WINDOW));

        // Exactly at the window boundary the sample is no longer recent
        assert!(!state.is_recent(arrived + RECENCY_WINDOW, RECENCY_WINDOW));
        assert!(!state.is_recent(ArrivalTime::from_secs(41), RECENCY_WINDOW));
    }

    #[test]
    fn test_pair_indexing() {
        let mut pair = SourcePair::new();
        let sample = PositionSample::live(SourceId::Coarse, &fix(1.0, 1.0));
        pair.get_mut(SourceId::Coarse).update(sample, ArrivalTime::ZERO);

        assert!(pair.coarse.is_valid());
        assert!(!pair.precise.is_valid());
        assert_eq!(pair.get(SourceId::Precise).source(), SourceId::Precise);
    }

    proptest! {
        #[test]
        fn prop_recent_implies_valid(
            updated in any::<bool>(),
            arrived_ms in 0u64..1_000_000,
            now_ms in 0u64..1_000_000,
            window_ms in 0u64..120_000,
        ) {
            let mut state = SourceState::new(SourceId::Precise);
            if updated {
                let sample = PositionSample::live(SourceId::Precise, &fix(10.0, 20.0));
                state.update(sample, ArrivalTime::from_millis(arrived_ms));
            }

            let now = ArrivalTime::from_millis(now_ms);
            let window = Duration::from_millis(window_ms);
            prop_assert!(!state.is_recent(now, window) || state.is_valid());
        }
    }
}
