//! Benchmarks for arbitration and bootstrap resolution

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use geoarb_arbiter::{resolve_initial, Arbiter, SourcePair};
use geoarb_core::{ArrivalTime, Coordinates, LocationFix, NativeTimestamp, PositionSample, SourceId};
use geoarb_test::{SensorFeed, SensorProfile};

fn fix(lat: f64, millis: i64) -> LocationFix {
    LocationFix::new(lat, lat, NativeTimestamp::from_millis(millis))
}

fn bench_select_precise_recent(c: &mut Criterion) {
    let arbiter = Arbiter::default();
    let mut pair = SourcePair::new();
    pair.precise
        .update(PositionSample::live(SourceId::Precise, &fix(1.0, 0)), ArrivalTime::from_secs(10));
    pair.coarse
        .update(PositionSample::live(SourceId::Coarse, &fix(2.0, 0)), ArrivalTime::from_secs(11));
    let now = ArrivalTime::from_secs(12);

    c.bench_function("select_precise_recent", |b| {
        b.iter(|| black_box(arbiter.select_pair(black_box(&pair), now).map(|s| s.source)))
    });
}

fn bench_select_latest_arrival(c: &mut Criterion) {
    let arbiter = Arbiter::default();
    let mut pair = SourcePair::new();
    pair.precise
        .update(PositionSample::live(SourceId::Precise, &fix(1.0, 0)), ArrivalTime::from_secs(10));
    pair.coarse
        .update(PositionSample::live(SourceId::Coarse, &fix(2.0, 0)), ArrivalTime::from_secs(50));
    let now = ArrivalTime::from_secs(60);

    c.bench_function("select_latest_arrival", |b| {
        b.iter(|| black_box(arbiter.select_pair(black_box(&pair), now).map(|s| s.source)))
    });
}

fn bench_update_and_select(c: &mut Criterion) {
    let arbiter = Arbiter::default();
    let mut pair = SourcePair::new();
    let mut now = ArrivalTime::ZERO;
    let step = Duration::from_millis(500);
    let sample = PositionSample::live(SourceId::Coarse, &fix(3.0, 0));

    c.bench_function("update_and_select", |b| {
        b.iter(|| {
            now = now + step;
            pair.coarse.update(sample, now);
            black_box(arbiter.select_pair(&pair, now).map(|s| s.source))
        })
    });
}

fn bench_resolve_initial(c: &mut Criterion) {
    c.bench_function("resolve_initial", |b| {
        b.iter(|| {
            black_box(resolve_initial(
                black_box(Ok(Some(fix(1.0, 1_000)))),
                black_box(Ok(Some(fix(2.0, 2_000)))),
            ))
        })
    });
}

fn bench_sensor_feed_tick(c: &mut Criterion) {
    let mut feed = SensorFeed::with_seed(
        SensorProfile::gps_urban(),
        Coordinates::new(48.85, 2.35),
        42,
    )
    .moving((0.0001, 0.0));
    let dt = Duration::from_millis(100);

    c.bench_function("sensor_feed_tick", |b| b.iter(|| black_box(feed.tick(dt))));
}

criterion_group!(
    benches,
    bench_select_precise_recent,
    bench_select_latest_arrival,
    bench_update_and_select,
    bench_resolve_initial,
    bench_sensor_feed_tick,
);
criterion_main!(benches);
