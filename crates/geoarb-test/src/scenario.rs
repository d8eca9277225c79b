//! Scenario harness
//!
//! Drives a real [`ArbitrationStream`] with two seeded sensor feeds on a
//! manual clock, and checks every emission against the selection rules
//! observed from outside the stream.

use std::sync::Arc;
use std::time::Duration;

use geoarb_core::{
    ArbitrationResult, ArrivalTime, Coordinates, GeoArbResult, LocationFix, Provenance, SourceId,
};
use geoarb_runtime::{ArbitrationStream, StreamConfig, Subscription};
use geoarb_time::ManualClock;

use crate::{SensorFeed, SensorProfile, SimulatedLocationService};

/// Scenario configuration
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub precise: SensorProfile,
    pub coarse: SensorProfile,
    /// Starting point of the simulated track
    pub start: Coordinates,
    /// Degrees per second along (latitude, longitude)
    pub velocity: (f64, f64),
    pub duration: Duration,
    pub tick: Duration,
    pub seed: u64,
    pub cached_precise: Option<LocationFix>,
    pub cached_coarse: Option<LocationFix>,
    pub stream: StreamConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            precise: SensorProfile::gps_open_sky(),
            coarse: SensorProfile::network(),
            start: Coordinates::new(52.52, 13.405),
            velocity: (0.0001, 0.00005),
            duration: Duration::from_secs(120),
            tick: Duration::from_millis(500),
            seed: 1,
            cached_precise: None,
            cached_coarse: None,
            stream: StreamConfig {
                stop_delay: Duration::ZERO,
                ..StreamConfig::default()
            },
        }
    }
}

impl ScenarioConfig {
    /// Open-sky drive through a 60 second tunnel
    pub fn commute() -> Self {
        ScenarioConfig {
            precise: SensorProfile::gps_open_sky()
                .with_outage(Duration::from_secs(60)..Duration::from_secs(120)),
            duration: Duration::from_secs(180),
            ..Self::default()
        }
    }

    /// Satellite fix lost between buildings most of the time
    pub fn urban() -> Self {
        ScenarioConfig {
            precise: SensorProfile::gps_urban(),
            ..Self::default()
        }
    }

    /// No satellite fix at all
    pub fn indoor() -> Self {
        ScenarioConfig {
            precise: SensorProfile::gps_open_sky().with_outage(Duration::ZERO..Duration::MAX),
            velocity: (0.0, 0.0),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cached(mut self, source: SourceId, fix: LocationFix) -> Self {
        match source {
            SourceId::Precise => self.cached_precise = Some(fix),
            SourceId::Coarse => self.cached_coarse = Some(fix),
        }
        self
    }
}

/// Scenario outcome
#[derive(Clone, Debug, Default)]
pub struct ScenarioResult {
    /// Every result observed, bootstrap included
    pub emissions: Vec<ArbitrationResult>,
    pub updates_delivered: u64,
    pub precise_wins: u64,
    pub coarse_wins: u64,
    pub violations: Vec<String>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn bootstrap(&self) -> Option<&ArbitrationResult> {
        self.emissions.first()
    }
}

/// Latest fix delivered per source, as seen from outside the stream
#[derive(Default)]
struct Expectations {
    last: [Option<(LocationFix, ArrivalTime)>; 2],
}

impl Expectations {
    fn record(&mut self, source: SourceId, fix: LocationFix, at: ArrivalTime) {
        self.last[source.index()] = Some((fix, at));
    }

    fn precise_recent(&self, now: ArrivalTime, window: Duration) -> bool {
        self.last[SourceId::Precise.index()]
            .map(|(_, at)| now.saturating_since(at) < window)
            .unwrap_or(false)
    }

    fn coordinates(&self, source: SourceId) -> Option<Coordinates> {
        self.last[source.index()].map(|(fix, _)| fix.coordinates)
    }
}

/// Runs one scenario to completion
pub struct ScenarioRunner {
    config: ScenarioConfig,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig) -> Self {
        ScenarioRunner { config }
    }

    pub async fn run(&self) -> GeoArbResult<ScenarioResult> {
        let config = &self.config;

        let mut service = SimulatedLocationService::new();
        if let Some(fix) = config.cached_precise {
            service = service.with_cached(SourceId::Precise, fix);
        }
        if let Some(fix) = config.cached_coarse {
            service = service.with_cached(SourceId::Coarse, fix);
        }
        let service = Arc::new(service);
        let clock = ManualClock::new();

        let stream = ArbitrationStream::spawn_with_clock(
            service.clone(),
            Arc::new(clock.clone()),
            config.stream.clone(),
        )?;
        let mut subscription = stream.subscribe()?;
        stream.barrier().await?;

        let mut precise = SensorFeed::with_seed(config.precise.clone(), config.start, config.seed)
            .moving(config.velocity);
        let mut coarse = SensorFeed::with_seed(
            config.coarse.clone(),
            config.start,
            config.seed.wrapping_add(1),
        )
        .moving(config.velocity);

        let mut result = ScenarioResult::default();
        let mut expectations = Expectations::default();
        drain(&mut subscription, &mut result.emissions);
        self.check_bootstrap(&mut result);

        let steps = (config.duration.as_micros() / config.tick.as_micros().max(1)) as u64;
        for _ in 0..steps {
            let now = clock.advance(config.tick);

            for (source, feed) in [
                (SourceId::Precise, &mut precise),
                (SourceId::Coarse, &mut coarse),
            ] {
                let Some(fix) = feed.tick(config.tick) else {
                    continue;
                };
                if !service.emit(source, fix) {
                    result
                        .violations
                        .push(format!("{} not subscribed at {:?}", source, now));
                    continue;
                }
                result.updates_delivered += 1;
                expectations.record(source, fix, now);

                stream.barrier().await?;
                let before = result.emissions.len();
                drain(&mut subscription, &mut result.emissions);
                self.check_update(&mut result, &expectations, before, now);
            }
        }

        drop(subscription);
        stream.shutdown().await?;

        tracing::debug!(
            updates = result.updates_delivered,
            emissions = result.emissions.len(),
            precise_wins = result.precise_wins,
            coarse_wins = result.coarse_wins,
            "Scenario finished"
        );
        Ok(result)
    }

    fn check_bootstrap(&self, result: &mut ScenarioResult) {
        let Some(first) = result.emissions.first() else {
            result.violations.push("no bootstrap emission".to_string());
            return;
        };
        let expected = match (self.config.cached_precise, self.config.cached_coarse) {
            (None, None) => Provenance::Dummy,
            _ => Provenance::Initial,
        };
        if first.provenance() != expected {
            result.violations.push(format!(
                "bootstrap was {}, expected {}",
                first.provenance(),
                expected
            ));
        }
    }

    /// Each delivered update yields exactly one emission: there is always a
    /// valid source once anything has been delivered.
    fn check_update(
        &self,
        result: &mut ScenarioResult,
        expectations: &Expectations,
        before: usize,
        now: ArrivalTime,
    ) {
        let emitted = &result.emissions[before..];
        let [emission] = emitted else {
            result.violations.push(format!(
                "expected one emission at {:?}, got {}",
                now,
                emitted.len()
            ));
            return;
        };

        let window = self.config.stream.recency_window;
        let Provenance::Live(winner) = emission.provenance() else {
            result.violations.push(format!(
                "non-live emission {} at {:?}",
                emission.provenance(),
                now
            ));
            return;
        };

        if expectations.precise_recent(now, window) && winner != SourceId::Precise {
            result
                .violations
                .push(format!("coarse won at {:?} while precise was recent", now));
        }
        if expectations.coordinates(winner) != Some(emission.coordinates()) {
            result.violations.push(format!(
                "{} emission at {:?} is not that source's latest fix",
                winner, now
            ));
        }

        match winner {
            SourceId::Precise => result.precise_wins += 1,
            SourceId::Coarse => result.coarse_wins += 1,
        }
    }
}

fn drain(subscription: &mut Subscription, into: &mut Vec<ArbitrationResult>) {
    while let Some(result) = subscription.try_recv() {
        into.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commute_scenario() {
        let result = ScenarioRunner::new(ScenarioConfig::commute()).run().await.unwrap();

        assert!(result.passed(), "violations: {:?}", result.violations);
        assert_eq!(result.bootstrap().unwrap().provenance(), Provenance::Dummy);
        assert!(result.precise_wins > 0);
        // Coarse takes over once the tunnel has outlasted the recency window
        assert!(result.coarse_wins > 0);
    }

    #[tokio::test]
    async fn test_indoor_scenario_is_all_coarse() {
        let result = ScenarioRunner::new(ScenarioConfig::indoor()).run().await.unwrap();

        assert!(result.passed(), "violations: {:?}", result.violations);
        assert_eq!(result.precise_wins, 0);
        assert!(result.coarse_wins > 0);
    }

    #[tokio::test]
    async fn test_urban_scenario_across_seeds() {
        for seed in 0..4 {
            let result = ScenarioRunner::new(ScenarioConfig::urban().with_seed(seed))
                .run()
                .await
                .unwrap();
            assert!(result.passed(), "seed {}: {:?}", seed, result.violations);
        }
    }

    #[tokio::test]
    async fn test_cached_fix_bootstraps_as_initial() {
        let cached = LocationFix::new(52.5, 13.4, geoarb_core::NativeTimestamp::from_millis(5));
        let config = ScenarioConfig::indoor().with_cached(SourceId::Coarse, cached);
        let result = ScenarioRunner::new(config).run().await.unwrap();

        assert!(result.passed(), "violations: {:?}", result.violations);
        let bootstrap = result.bootstrap().unwrap();
        assert_eq!(bootstrap.provenance(), Provenance::Initial);
        assert_eq!(bootstrap.coordinates(), cached.coordinates);
    }
}
