//! GEOARB Demo Application
//!
//! Runs the arbitration stream against two simulated sensors in real time:
//! - GPS at 1 Hz, lost in a tunnel between 6s and 14s
//! - Network positioning every 2s
//!
//! Usage: `geoarb-demo [config.json] [seconds]`

use std::sync::Arc;
use std::time::Duration;

use geoarb_core::{Coordinates, SourceId};
use geoarb_runtime::{init_logging, ArbitrationStream, RuntimeConfig};
use geoarb_test::{SensorFeed, SensorProfile, SimulatedLocationService};

const TICK: Duration = Duration::from_millis(100);

/// Number of sensor ticks in a run of `seconds`
fn tick_count(seconds: u64) -> u64 {
    seconds.saturating_mul(1000) / TICK.as_millis() as u64
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => RuntimeConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => RuntimeConfig::default(),
    };
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(20);

    init_logging(&config.logging)?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           GEOARB Demo - GPS / Network Arbitration          ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!(
        "recency window {:?}, stop delay {:?}, running {}s",
        config.stream.recency_window, config.stream.stop_delay, seconds
    );
    println!();

    let service = Arc::new(SimulatedLocationService::new());
    let stream = ArbitrationStream::spawn(service.clone(), config.stream.clone())?;
    let mut subscription = stream.subscribe()?;

    let start = Coordinates::new(52.52, 13.405);
    let velocity = (0.00005, 0.00008);
    let mut gps = SensorFeed::with_seed(
        SensorProfile::gps_open_sky().with_outage(Duration::from_secs(6)..Duration::from_secs(14)),
        start,
        1,
    )
    .moving(velocity);
    let mut network = SensorFeed::with_seed(
        SensorProfile {
            interval: Duration::from_secs(2),
            ..SensorProfile::network()
        },
        start,
        2,
    )
    .moving(velocity);

    let sensors = {
        let service = service.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            let ticks = tick_count(seconds);
            for _ in 0..ticks {
                ticker.tick().await;
                if let Some(fix) = gps.tick(TICK) {
                    service.emit(SourceId::Precise, fix);
                }
                if let Some(fix) = network.tick(TICK) {
                    service.emit(SourceId::Coarse, fix);
                }
            }
            tracing::info!(
                gps = gps.stats().produced,
                network = network.stats().produced,
                "Sensor simulation finished"
            );
        })
    };

    let printer = tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        while let Some(result) = subscription.recv().await {
            let position = result.coordinates();
            println!(
                "[{:>6.1}s] {:<12} {:>10.6}, {:>10.6}",
                started.elapsed().as_secs_f64(),
                result.provenance().to_string(),
                position.latitude,
                position.longitude
            );
        }
    });

    sensors.await?;
    let stats = stream.stats().await?;
    stream.shutdown().await?;
    printer.await?;

    println!();
    println!(
        "updates: {}, emissions: {}, ignored: {}",
        stats.updates_received, stats.emissions, stats.updates_ignored
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_count() {
        assert_eq!(tick_count(0), 0);
        assert_eq!(tick_count(20), 200);
        assert_eq!(tick_count(u64::MAX), u64::MAX / 100);
    }
}
