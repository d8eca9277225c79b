//! In-crate fake location service for unit tests

use parking_lot::Mutex;

use geoarb_core::{GeoArbError, GeoArbResult, LocationFix, SourceId};

use crate::{LocationService, UpdateSink};

#[derive(Default)]
struct FakeInner {
    cached: [Option<LocationFix>; 2],
    unavailable: [bool; 2],
    sinks: [Option<UpdateSink>; 2],
    requests: [u32; 2],
    removals: [u32; 2],
}

#[derive(Default)]
pub(crate) struct FakeService {
    inner: Mutex<FakeInner>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_cached(&self, source: SourceId, fix: LocationFix) {
        self.inner.lock().cached[source.index()] = Some(fix);
    }

    pub(crate) fn set_unavailable(&self, source: SourceId) {
        self.inner.lock().unavailable[source.index()] = true;
    }

    pub(crate) fn requests(&self, source: SourceId) -> u32 {
        self.inner.lock().requests[source.index()]
    }

    pub(crate) fn removals(&self, source: SourceId) -> u32 {
        self.inner.lock().removals[source.index()]
    }

    /// Deliver a fix through the currently registered sink
    pub(crate) fn push(&self, source: SourceId, fix: LocationFix) -> bool {
        let sink = self.inner.lock().sinks[source.index()].clone();
        sink.map(|sink| sink.deliver(fix)).unwrap_or(false)
    }

    /// Sink registered for `source`, kept even after removal
    pub(crate) fn sink(&self, source: SourceId) -> Option<UpdateSink> {
        self.inner.lock().sinks[source.index()].clone()
    }
}

impl LocationService for FakeService {
    fn last_known_location(&self, source: SourceId) -> GeoArbResult<Option<LocationFix>> {
        Ok(self.inner.lock().cached[source.index()])
    }

    fn request_updates(&self, source: SourceId, sink: UpdateSink) -> GeoArbResult<()> {
        let mut inner = self.inner.lock();
        inner.requests[source.index()] += 1;
        if inner.unavailable[source.index()] {
            return Err(GeoArbError::SubscriptionUnavailable {
                sensor: source,
                reason: "provider does not exist".to_string(),
            });
        }
        inner.sinks[source.index()] = Some(sink);
        Ok(())
    }

    fn remove_updates(&self, source: SourceId) {
        self.inner.lock().removals[source.index()] += 1;
    }
}
