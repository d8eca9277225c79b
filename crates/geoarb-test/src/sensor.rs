//! Seeded sensor feeds
//!
//! A feed walks a straight track from a starting point and produces fixes at
//! the profile's interval, with position noise, random dropouts and scheduled
//! outages (tunnels, buildings).

use std::ops::Range;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use geoarb_core::{Coordinates, LocationFix, NativeTimestamp};

/// Native timestamp of the simulation's start, in platform epoch millis
pub const EPOCH_START_MILLIS: i64 = 1_700_000_000_000;

/// Behaviour of one simulated sensor
#[derive(Clone, Debug)]
pub struct SensorProfile {
    /// Time between fixes
    pub interval: Duration,
    /// Maximum position noise, in degrees
    pub noise_deg: f64,
    /// Probability that a due fix is lost
    pub dropout: f64,
    /// Windows (relative to feed start) during which nothing is produced
    pub outages: Vec<Range<Duration>>,
}

impl SensorProfile {
    /// Satellite fix with clear sky view
    pub fn gps_open_sky() -> Self {
        SensorProfile {
            interval: Duration::from_secs(1),
            noise_deg: 0.00002,
            dropout: 0.02,
            outages: Vec::new(),
        }
    }

    /// Satellite fix between tall buildings
    pub fn gps_urban() -> Self {
        SensorProfile {
            interval: Duration::from_secs(1),
            noise_deg: 0.0002,
            dropout: 0.3,
            outages: Vec::new(),
        }
    }

    /// Cell/Wi-Fi positioning
    pub fn network() -> Self {
        SensorProfile {
            interval: Duration::from_secs(5),
            noise_deg: 0.002,
            dropout: 0.05,
            outages: Vec::new(),
        }
    }

    /// Add an outage window
    pub fn with_outage(mut self, window: Range<Duration>) -> Self {
        self.outages.push(window);
        self
    }

    fn in_outage(&self, elapsed: Duration) -> bool {
        self.outages.iter().any(|window| window.contains(&elapsed))
    }
}

/// Statistics for one feed
#[derive(Clone, Debug, Default)]
pub struct FeedStats {
    pub produced: u64,
    pub dropped: u64,
    pub suppressed_by_outage: u64,
}

/// Deterministic fix generator
pub struct SensorFeed {
    profile: SensorProfile,
    rng: StdRng,
    start: Coordinates,
    /// Degrees per second along (latitude, longitude)
    velocity: (f64, f64),
    elapsed: Duration,
    next_due: Duration,
    stats: FeedStats,
}

impl SensorFeed {
    pub fn new(profile: SensorProfile, start: Coordinates) -> Self {
        Self::with_seed(profile, start, 0)
    }

    pub fn with_seed(profile: SensorProfile, start: Coordinates, seed: u64) -> Self {
        SensorFeed {
            next_due: profile.interval,
            profile,
            rng: StdRng::seed_from_u64(seed),
            start,
            velocity: (0.0, 0.0),
            elapsed: Duration::ZERO,
            stats: FeedStats::default(),
        }
    }

    /// Move along a straight track at `velocity` degrees per second
    pub fn moving(mut self, velocity: (f64, f64)) -> Self {
        self.velocity = velocity;
        self
    }

    /// True position at `elapsed`, without noise
    pub fn track_position(&self, elapsed: Duration) -> Coordinates {
        let secs = elapsed.as_secs_f64();
        Coordinates::new(
            self.start.latitude + self.velocity.0 * secs,
            self.start.longitude + self.velocity.1 * secs,
        )
    }

    /// Advance by `dt` and return the fix that came due, if any
    ///
    /// At most one fix is produced per call; ticks should be no longer than
    /// the profile's interval.
    pub fn tick(&mut self, dt: Duration) -> Option<LocationFix> {
        self.elapsed += dt;
        if self.elapsed < self.next_due {
            return None;
        }
        self.next_due = self.elapsed + self.profile.interval;

        if self.profile.in_outage(self.elapsed) {
            self.stats.suppressed_by_outage += 1;
            return None;
        }
        if self.profile.dropout > 0.0 && self.rng.gen::<f64>() < self.profile.dropout {
            self.stats.dropped += 1;
            return None;
        }

        let truth = self.track_position(self.elapsed);
        let noise = self.profile.noise_deg;
        let (dlat, dlon) = if noise > 0.0 {
            (
                self.rng.gen_range(-noise..=noise),
                self.rng.gen_range(-noise..=noise),
            )
        } else {
            (0.0, 0.0)
        };

        self.stats.produced += 1;
        Some(LocationFix::new(
            truth.latitude + dlat,
            truth.longitude + dlon,
            NativeTimestamp::from_millis(EPOCH_START_MILLIS + self.elapsed.as_millis() as i64),
        ))
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }
}
