//! Position samples and arbitration results
//!
//! A sample is immutable once built. Its [`SampleId`] is the identity used to
//! tell a genuinely new winner apart from a re-selection of the same sample.

use crate::{NativeTimestamp, Provenance, SampleId, SourceId};

/// Geographic coordinates in floating-point degrees
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Sentinel used for the dummy bootstrap sample
    pub const ORIGIN: Coordinates = Coordinates {
        latitude: 0.0,
        longitude: 0.0,
    };

    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }
}

/// A fix as reported by the platform location service
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    /// Sensor's own timestamp for the fix
    pub time: NativeTimestamp,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, time: NativeTimestamp) -> Self {
        LocationFix {
            coordinates: Coordinates::new(latitude, longitude),
            time,
        }
    }
}

/// Immutable position value flowing through the stream
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionSample {
    id: SampleId,
    coordinates: Coordinates,
    provenance: Provenance,
}

impl PositionSample {
    /// Build a sample with a freshly allocated identity
    pub fn new(provenance: Provenance, coordinates: Coordinates) -> Self {
        PositionSample {
            id: SampleId::next(),
            coordinates,
            provenance,
        }
    }

    /// Sample for a live update from `source`
    pub fn live(source: SourceId, fix: &LocationFix) -> Self {
        Self::new(Provenance::Live(source), fix.coordinates)
    }

    /// Bootstrap sample copied from a cached fix
    pub fn initial(coordinates: Coordinates) -> Self {
        Self::new(Provenance::Initial, coordinates)
    }

    /// Bootstrap sentinel at the origin
    pub fn dummy() -> Self {
        Self::new(Provenance::Dummy, Coordinates::ORIGIN)
    }

    #[inline]
    pub fn id(&self) -> SampleId {
        self.id
    }

    #[inline]
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }

    #[inline]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.provenance.is_live()
    }
}

/// Value emitted to stream observers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArbitrationResult {
    pub sample: PositionSample,
    /// Identity of the sample this result was built from
    pub as_of: SampleId,
}

impl ArbitrationResult {
    pub fn new(sample: PositionSample) -> Self {
        ArbitrationResult {
            as_of: sample.id(),
            sample,
        }
    }

    #[inline]
    pub fn provenance(&self) -> Provenance {
        self.sample.provenance()
    }

    #[inline]
    pub fn coordinates(&self) -> Coordinates {
        self.sample.coordinates()
    }
}

impl From<PositionSample> for ArbitrationResult {
    fn from(sample: PositionSample) -> Self {
        ArbitrationResult::new(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_sample_is_origin() {
        let dummy = PositionSample::dummy();
        assert_eq!(dummy.provenance(), Provenance::Dummy);
        assert_eq!(dummy.coordinates(), Coordinates::ORIGIN);
        assert!(!dummy.is_live());
    }

    #[test]
    fn test_identical_coordinates_are_distinct_samples() {
        let fix = LocationFix::new(48.85, 2.35, NativeTimestamp::from_millis(1));
        let a = PositionSample::live(SourceId::Precise, &fix);
        let b = PositionSample::live(SourceId::Precise, &fix);

        assert_eq!(a.coordinates(), b.coordinates());
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_result_as_of_tracks_sample() {
        let sample = PositionSample::initial(Coordinates::new(1.0, 2.0));
        let result = ArbitrationResult::from(sample);
        assert_eq!(result.as_of, sample.id());
        assert_eq!(result.provenance(), Provenance::Initial);
    }
}
