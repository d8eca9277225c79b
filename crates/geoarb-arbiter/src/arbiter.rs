//! Freshness/availability selection between the precise and coarse sources
//!
//! # Selection Logic
//!
//! Evaluated in this exact order:
//! 1. Precise recent, or no coarse value at all: precise if valid, else nothing
//! 2. Precise never seen: coarse
//! 3. Both valid, precise stale: the later arrival wins, ties go to precise
//!
//! A recent precise reading always beats coarse, whatever their arrival order.
//! Equal arrival times in step 3 go to precise, the same tie rule the bootstrap
//! uses for native timestamps; coarse never wins a tie. Through the stream a
//! step 3 tie cannot happen: an update is selected at its own arrival time, so
//! a precise fix arriving at that instant is still recent and step 1 applies.

use std::time::Duration;

use geoarb_core::{ArrivalTime, PositionSample, SourceId, RECENCY_WINDOW};

use crate::{SourcePair, SourceState};

/// Winning source of one arbitration round
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection<'a> {
    pub source: SourceId,
    pub state: &'a SourceState,
}

impl<'a> Selection<'a> {
    /// Latest sample of the winning source
    pub fn sample(&self) -> Option<&'a PositionSample> {
        self.state.last_sample()
    }
}

/// Selection policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arbiter {
    recency_window: Duration,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new(RECENCY_WINDOW)
    }
}

impl Arbiter {
    pub fn new(recency_window: Duration) -> Self {
        Arbiter { recency_window }
    }

    #[inline]
    pub fn recency_window(&self) -> Duration {
        self.recency_window
    }

    /// Pick the best current source, `None` when no data is available yet
    pub fn select<'a>(
        &self,
        precise: &'a SourceState,
        coarse: &'a SourceState,
        now: ArrivalTime,
    ) -> Option<Selection<'a>> {
        let pick = |state: &'a SourceState| Selection {
            source: state.source(),
            state,
        };

        if precise.is_recent(now, self.recency_window) || !coarse.is_valid() {
            return precise.is_valid().then(|| pick(precise));
        }

        if !precise.is_valid() {
            return Some(pick(coarse));
        }

        // Both valid and precise is stale: both arrival times are present here
        if precise.last_arrival() >= coarse.last_arrival() {
            Some(pick(precise))
        } else {
            Some(pick(coarse))
        }
    }

    /// [`Arbiter::select`] over a [`SourcePair`]
    pub fn select_pair<'a>(&self, pair: &'a SourcePair, now: ArrivalTime) -> Option<Selection<'a>> {
        self.select(&pair.precise, &pair.coarse, now)
    }
}
