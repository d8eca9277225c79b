//! Simulated platform location service

use parking_lot::Mutex;

use geoarb_core::{GeoArbError, GeoArbResult, LocationFix, SourceId};
use geoarb_runtime::{LocationService, UpdateSink};

/// Per-source call counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceCalls {
    pub queries: u32,
    pub requests: u32,
    pub removals: u32,
    /// `request_updates` calls made while the source was already subscribed
    pub double_subscriptions: u32,
}

#[derive(Default)]
struct ServiceState {
    cached: [Option<LocationFix>; 2],
    failing_queries: [bool; 2],
    unavailable: [bool; 2],
    sinks: [Option<UpdateSink>; 2],
    calls: [SourceCalls; 2],
}

/// In-memory stand-in for the platform location manager
///
/// Mirrors platform behaviour: removing updates drops the registered sink, so
/// fixes emitted afterwards go nowhere.
#[derive(Default)]
pub struct SimulatedLocationService {
    state: Mutex<ServiceState>,
}

impl SimulatedLocationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform's cached last-known fix for `source`
    pub fn with_cached(self, source: SourceId, fix: LocationFix) -> Self {
        self.state.lock().cached[source.index()] = Some(fix);
        self
    }

    /// Make last-known lookups for `source` fail
    pub fn with_failing_query(self, source: SourceId) -> Self {
        self.state.lock().failing_queries[source.index()] = true;
        self
    }

    /// Make `source` absent from the device
    pub fn without_provider(self, source: SourceId) -> Self {
        self.state.lock().unavailable[source.index()] = true;
        self
    }

    /// Emit a fix from `source`
    ///
    /// Returns false when nobody is subscribed or the stream is gone.
    pub fn emit(&self, source: SourceId, fix: LocationFix) -> bool {
        let sink = self.state.lock().sinks[source.index()].clone();
        match sink {
            Some(sink) => sink.deliver(fix),
            None => false,
        }
    }

    pub fn is_subscribed(&self, source: SourceId) -> bool {
        self.state.lock().sinks[source.index()].is_some()
    }

    pub fn calls(&self, source: SourceId) -> SourceCalls {
        self.state.lock().calls[source.index()]
    }
}

impl LocationService for SimulatedLocationService {
    fn last_known_location(&self, source: SourceId) -> GeoArbResult<Option<LocationFix>> {
        let mut state = self.state.lock();
        state.calls[source.index()].queries += 1;

        if state.failing_queries[source.index()] {
            return Err(GeoArbError::QueryFailure {
                sensor: source,
                reason: "location permission revoked".to_string(),
            });
        }
        Ok(state.cached[source.index()])
    }

    fn request_updates(&self, source: SourceId, sink: UpdateSink) -> GeoArbResult<()> {
        let mut state = self.state.lock();
        let index = source.index();
        state.calls[index].requests += 1;

        if state.unavailable[index] {
            return Err(GeoArbError::SubscriptionUnavailable {
                sensor: source,
                reason: format!("provider {} does not exist", source),
            });
        }
        if state.sinks[index].is_some() {
            state.calls[index].double_subscriptions += 1;
        }
        state.sinks[index] = Some(sink);
        Ok(())
    }

    fn remove_updates(&self, source: SourceId) {
        let mut state = self.state.lock();
        state.calls[source.index()].removals += 1;
        state.sinks[source.index()] = None;
    }
}
