//! Bootstrap resolution from cached last-known fixes
//!
//! Before any live update arrives the stream still has to hand its observers a
//! usable position. The resolver picks the freshest cached fix, or falls back
//! to the dummy sample. Lookup failures are logged and treated as absent; they
//! never reach the caller.

use geoarb_core::{GeoArbResult, LocationFix, PositionSample, SourceId};

/// Outcome of a last-known-location lookup for one source
pub type CachedLookup = GeoArbResult<Option<LocationFix>>;

/// Resolve the initial sample from the two cached lookups.
///
/// The freshest cached fix by native timestamp wins, ties go to precise. The
/// chosen coordinates are re-tagged as `Initial`.
pub fn resolve_initial(precise: CachedLookup, coarse: CachedLookup) -> PositionSample {
    let precise = absorb(SourceId::Precise, precise);
    let coarse = absorb(SourceId::Coarse, coarse);

    let chosen = match (precise, coarse) {
        (Some(p), Some(c)) => {
            if p.time >= c.time {
                p
            } else {
                c
            }
        }
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (None, None) => {
            tracing::info!("No last known location available, starting from dummy location");
            return PositionSample::dummy();
        }
    };

    tracing::debug!(
        lat = chosen.coordinates.latitude,
        lon = chosen.coordinates.longitude,
        "Initial location from last known fix"
    );
    PositionSample::initial(chosen.coordinates)
}

/// Treat a failed lookup as absent, logging the failure
fn absorb(source: SourceId, lookup: CachedLookup) -> Option<LocationFix> {
    match lookup {
        Ok(fix) => fix,
        Err(e) => {
            tracing::error!(source = %source, error = %e, "Error when retrieving last known location");
            None
        }
    }
}

/// Stateless resolver over a pair of cached lookups
#[derive(Clone, Copy, Debug, Default)]
pub struct BootstrapResolver;

impl BootstrapResolver {
    pub fn new() -> Self {
        BootstrapResolver
    }

    /// Run both lookups and resolve the initial sample
    ///
    /// `lookup` is called once per source, precise first.
    pub fn resolve_with<F>(&self, mut lookup: F) -> PositionSample
    where
        F: FnMut(SourceId) -> CachedLookup,
    {
        let precise = lookup(SourceId::Precise);
        let coarse = lookup(SourceId::Coarse);
        resolve_initial(precise, coarse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoarb_core::{Coordinates, GeoArbError, NativeTimestamp, Provenance};

    fn cached(lat: f64, lon: f64, time_ms: i64) -> CachedLookup {
        Ok(Some(LocationFix::new(lat, lon, NativeTimestamp::from_millis(time_ms))))
    }

    fn failed(source: SourceId) -> CachedLookup {
        Err(GeoArbError::QueryFailure {
            sensor: source,
            reason: "permission denied".to_string(),
        })
    }

    #[test]
    fn test_newest_cached_fix_wins() {
        let sample = resolve_initial(cached(1.0, 1.0, 1_000), cached(2.0, 2.0, 2_000));
        assert_eq!(sample.coordinates(), Coordinates::new(2.0, 2.0));
        assert_eq!(sample.provenance(), Provenance::Initial);

        let sample = resolve_initial(cached(1.0, 1.0, 3_000), cached(2.0, 2.0, 2_000));
        assert_eq!(sample.coordinates(), Coordinates::new(1.0, 1.0));
    }

    #[test]
    fn test_equal_timestamps_favor_precise() {
        let sample = resolve_initial(cached(10.0, 20.0, 5_000), cached(30.0, 40.0, 5_000));
        assert_eq!(sample.coordinates(), Coordinates::new(10.0, 20.0));
    }

    #[test]
    fn test_single_cached_fix_is_used() {
        let sample = resolve_initial(Ok(None), cached(3.0, 4.0, 0));
        assert_eq!(sample.coordinates(), Coordinates::new(3.0, 4.0));

        let sample = resolve_initial(cached(5.0, 6.0, 0), Ok(None));
        assert_eq!(sample.coordinates(), Coordinates::new(5.0, 6.0));
        assert!(!sample.is_live());
    }

    #[test]
    fn test_nothing_cached_yields_dummy() {
        let sample = resolve_initial(Ok(None), Ok(None));
        assert_eq!(sample.provenance(), Provenance::Dummy);
        assert_eq!(sample.coordinates(), Coordinates::ORIGIN);
    }

    #[test]
    fn test_failed_lookups_are_absorbed() {
        let sample = resolve_initial(failed(SourceId::Precise), failed(SourceId::Coarse));
        assert_eq!(sample.provenance(), Provenance::Dummy);
        assert_eq!(sample.coordinates(), Coordinates::ORIGIN);

        // A failure on one side still lets the other cached fix through
        let sample = resolve_initial(failed(SourceId::Precise), cached(7.0, 8.0, 0));
        assert_eq!(sample.provenance(), Provenance::Initial);
        assert_eq!(sample.coordinates(), Coordinates::new(7.0, 8.0));
    }

    #[test]
    fn test_resolver_queries_both_sources() {
        let mut queried = Vec::new();
        let sample = BootstrapResolver::new().resolve_with(|source| {
            queried.push(source);
            match source {
                SourceId::Precise => Ok(None),
                SourceId::Coarse => cached(9.0, 9.5, 42),
            }
        });

        assert_eq!(queried, vec![SourceId::Precise, SourceId::Coarse]);
        assert_eq!(sample.coordinates(), Coordinates::new(9.0, 9.5));
    }
}
