//! Identity types for GEOARB
//!
//! Exactly two live sensor sources exist. Bootstrap-only samples carry a
//! pseudo provenance that downstream consumers can tell apart from live data.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live sensor source identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    /// High-accuracy, power-hungry source (satellite based)
    Precise,
    /// Lower-accuracy, mostly-available source (network based)
    Coarse,
}

impl SourceId {
    /// Both live sources, in subscription order
    pub const ALL: [SourceId; 2] = [SourceId::Coarse, SourceId::Precise];

    /// Platform provider name
    #[inline]
    pub fn provider_name(self) -> &'static str {
        match self {
            SourceId::Precise => "gps",
            SourceId::Coarse => "network",
        }
    }

    /// Dense index for per-source tables
    #[inline]
    pub fn index(self) -> usize {
        match self {
            SourceId::Precise => 0,
            SourceId::Coarse => 1,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_name())
    }
}

/// Where a position sample came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Live update from a sensor source
    Live(SourceId),
    /// Bootstrap value copied from a cached last-known fix
    Initial,
    /// Bootstrap sentinel when nothing was known
    Dummy,
}

impl Provenance {
    pub const PRECISE: Provenance = Provenance::Live(SourceId::Precise);
    pub const COARSE: Provenance = Provenance::Live(SourceId::Coarse);

    /// True only for samples produced by a live sensor update
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, Provenance::Live(_))
    }

    #[inline]
    pub fn source(self) -> Option<SourceId> {
        match self {
            Provenance::Live(source) => Some(source),
            Provenance::Initial | Provenance::Dummy => None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live(source) => write!(f, "{}", source),
            Provenance::Initial => f.write_str("initial"),
            Provenance::Dummy => f.write_str("dummy"),
        }
    }
}

static NEXT_SAMPLE_ID: AtomicU64 = AtomicU64::new(1);

/// Sample identity - unique per process, strictly increasing in allocation order
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleId(pub u64);

impl SampleId {
    /// Allocate a fresh identity
    #[inline]
    pub fn next() -> Self {
        SampleId(NEXT_SAMPLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sample(#{})", self.0)
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_liveness() {
        assert!(Provenance::PRECISE.is_live());
        assert!(Provenance::COARSE.is_live());
        assert!(!Provenance::Initial.is_live());
        assert!(!Provenance::Dummy.is_live());

        assert_eq!(Provenance::COARSE.source(), Some(SourceId::Coarse));
        assert_eq!(Provenance::Dummy.source(), None);
    }

    #[test]
    fn test_sample_ids_increase() {
        let a = SampleId::next();
        let b = SampleId::next();
        assert!(b > a);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(SourceId::Precise.to_string(), "gps");
        assert_eq!(SourceId::Coarse.to_string(), "network");
        assert_eq!(Provenance::Initial.to_string(), "initial");
        assert_ne!(SourceId::Precise.index(), SourceId::Coarse.index());
    }
}
