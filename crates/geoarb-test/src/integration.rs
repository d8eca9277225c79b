//! End-to-end Integration Test Suite
//!
//! Walkthroughs of the stream's observable behaviour through the public API:
//! - Bootstrap selection and re-tagging
//! - Precise/coarse hand-over around the recency window
//! - Sensor lifecycle under observer churn
//! - Degraded platforms (failing lookups, missing providers)

use std::sync::Arc;
use std::time::Duration;

use geoarb_core::{
    ArbitrationResult, GeoArbResult, LocationFix, NativeTimestamp, Provenance, SourceId,
};
use geoarb_runtime::{ArbitrationStream, StreamConfig, Subscription};
use geoarb_time::ManualClock;

use crate::SimulatedLocationService;

// ============================================================================
// HARNESS
// ============================================================================

/// A stream wired to a simulated service and a manual clock
pub struct StreamHarness {
    pub service: Arc<SimulatedLocationService>,
    pub clock: ManualClock,
    pub stream: ArbitrationStream,
}

impl StreamHarness {
    /// Spawn on the current tokio runtime; sensors stop as soon as the last
    /// observer leaves
    pub fn new(service: SimulatedLocationService) -> GeoArbResult<Self> {
        Self::with_config(
            service,
            StreamConfig {
                stop_delay: Duration::ZERO,
                ..StreamConfig::default()
            },
        )
    }

    pub fn with_config(service: SimulatedLocationService, config: StreamConfig) -> GeoArbResult<Self> {
        let service = Arc::new(service);
        let clock = ManualClock::new();
        let stream =
            ArbitrationStream::spawn_with_clock(service.clone(), Arc::new(clock.clone()), config)?;

        Ok(StreamHarness {
            service,
            clock,
            stream,
        })
    }

    /// Subscribe and wait until the activation has been processed
    pub async fn observe(&self) -> GeoArbResult<Subscription> {
        let subscription = self.stream.subscribe()?;
        self.stream.barrier().await?;
        Ok(subscription)
    }

    /// Deliver a fix and return what the observer saw
    pub async fn deliver(
        &self,
        subscription: &mut Subscription,
        source: SourceId,
        fix: LocationFix,
    ) -> GeoArbResult<Option<ArbitrationResult>> {
        self.service.emit(source, fix);
        self.stream.barrier().await?;
        Ok(subscription.try_recv())
    }
}

/// Fix with a native timestamp in platform epoch millis
pub fn fix_at(latitude: f64, longitude: f64, millis: i64) -> LocationFix {
    LocationFix::new(latitude, longitude, NativeTimestamp::from_millis(millis))
}

// ============================================================================
// WALKTHROUGHS
// ============================================================================

/// Outcome of a walkthrough: the sequence seen by the observer
#[derive(Debug, Clone, Default)]
pub struct WalkthroughResult {
    pub seen: Vec<ArbitrationResult>,
    pub failures: Vec<String>,
}

impl WalkthroughResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    fn check(&mut self, step: &str, result: Option<ArbitrationResult>, provenance: Provenance) {
        match result {
            Some(result) => {
                if result.provenance() != provenance {
                    self.failures.push(format!(
                        "{}: got {}, expected {}",
                        step,
                        result.provenance(),
                        provenance
                    ));
                }
                self.seen.push(result);
            }
            None => self
                .failures
                .push(format!("{}: nothing emitted, expected {}", step, provenance)),
        }
    }
}

/// Empty cache, then coarse, precise, and coarse again after the window
pub async fn walkthrough_hand_over() -> GeoArbResult<WalkthroughResult> {
    let harness = StreamHarness::new(SimulatedLocationService::new())?;
    let mut result = WalkthroughResult::default();

    let mut observer = harness.observe().await?;
    result.check("bootstrap", observer.try_recv(), Provenance::Dummy);

    harness.clock.advance(Duration::from_secs(1));
    let coarse = harness
        .deliver(&mut observer, SourceId::Coarse, fix_at(1.0, 1.0, 1_000))
        .await?;
    result.check("first coarse", coarse, Provenance::COARSE);

    harness.clock.advance(Duration::from_secs(1));
    let precise = harness
        .deliver(&mut observer, SourceId::Precise, fix_at(2.0, 2.0, 2_000))
        .await?;
    result.check("first precise", precise, Provenance::PRECISE);

    harness.clock.advance(Duration::from_secs(1));
    let held = harness
        .deliver(&mut observer, SourceId::Coarse, fix_at(3.0, 3.0, 3_000))
        .await?;
    result.check("coarse while precise recent", held, Provenance::PRECISE);

    harness.clock.advance(Duration::from_secs(31));
    let stale = harness
        .deliver(&mut observer, SourceId::Coarse, fix_at(4.0, 4.0, 34_000))
        .await?;
    result.check("coarse after precise stale", stale, Provenance::COARSE);

    drop(observer);
    harness.stream.shutdown().await?;
    Ok(result)
}

/// Bootstrap from the freshest cached fix, re-tagged as initial
pub async fn walkthrough_bootstrap_from_cache() -> GeoArbResult<WalkthroughResult> {
    let service = SimulatedLocationService::new()
        .with_cached(SourceId::Precise, fix_at(10.0, 10.0, 1_000))
        .with_cached(SourceId::Coarse, fix_at(20.0, 20.0, 5_000));
    let harness = StreamHarness::new(service)?;
    let mut result = WalkthroughResult::default();

    let mut observer = harness.observe().await?;
    let bootstrap = observer.try_recv();
    result.check("bootstrap", bootstrap, Provenance::Initial);

    if let Some(bootstrap) = bootstrap {
        if bootstrap.coordinates().latitude != 20.0 {
            result
                .failures
                .push("bootstrap did not pick the freshest cached fix".to_string());
        }
    }

    drop(observer);
    harness.stream.shutdown().await?;
    Ok(result)
}

/// Observers come and go; each source is subscribed at most once at a time
pub async fn walkthrough_observer_churn() -> GeoArbResult<WalkthroughResult> {
    let harness = StreamHarness::new(SimulatedLocationService::new())?;
    let mut result = WalkthroughResult::default();

    for round in 0..3 {
        let first = harness.observe().await?;
        let second = harness.observe().await?;
        for source in SourceId::ALL {
            if !harness.service.is_subscribed(source) {
                result
                    .failures
                    .push(format!("round {}: {} not subscribed", round, source));
            }
        }

        drop(first);
        drop(second);
        harness.stream.barrier().await?;
        for source in SourceId::ALL {
            if harness.service.is_subscribed(source) {
                result
                    .failures
                    .push(format!("round {}: {} still subscribed", round, source));
            }
        }
    }

    for source in SourceId::ALL {
        let calls = harness.service.calls(source);
        if calls.double_subscriptions != 0 || calls.requests != 3 || calls.removals != 3 {
            result
                .failures
                .push(format!("{}: unexpected call counts {:?}", source, calls));
        }
    }

    harness.stream.shutdown().await?;
    Ok(result)
}
