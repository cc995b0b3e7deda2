//! BDD step definitions for the window aggregation feature

use std::time::Duration;

use cucumber::{given, then, when};
use tokio::time::Instant;
use vitals::{Sample, VitalsError, WindowAggregator};

use crate::world::VitalsWorld;

#[given(expr = "a sample with vitals {float}, {float}, {float}, {float} arrived {int} seconds ago")]
async fn sample_arrived_ago(
    world: &mut VitalsWorld,
    spo2: f64,
    temperature: f64,
    ecg: f64,
    gsr: f64,
    secs: u64,
) {
    let at = Instant::now() - Duration::from_secs(secs);
    world
        .buffer()
        .append_at(Sample::at(at, spo2, temperature, ecg, gsr), at)
        .await;
}

#[when(expr = "the buffer is averaged over {int} seconds")]
async fn averaged_over(world: &mut VitalsWorld, secs: u64) {
    let aggregator = WindowAggregator::new(world.buffer());
    world.aggregate_result = Some(aggregator.average(Duration::from_secs(secs)).await);
}

#[then(expr = "the average is {float}, {float}, {float}, {float} over {int} samples")]
fn average_is(
    world: &mut VitalsWorld,
    spo2: f64,
    temperature: f64,
    ecg: f64,
    gsr: f64,
    count: usize,
) {
    let aggregate = match world.aggregate_result.as_ref().expect("no average computed") {
        Ok(aggregate) => aggregate,
        Err(e) => panic!("expected an average, got error: {}", e),
    };
    assert_eq!(aggregate.sample_count, count);
    assert!((aggregate.spo2 - spo2).abs() < 1e-9);
    assert!((aggregate.temperature - temperature).abs() < 1e-9);
    assert!((aggregate.ecg - ecg).abs() < 1e-9);
    assert!((aggregate.gsr - gsr).abs() < 1e-9);
}

#[then("averaging fails with insufficient data")]
fn averaging_fails(world: &mut VitalsWorld) {
    let result = world.aggregate_result.as_ref().expect("no average computed");
    assert!(
        matches!(result, Err(VitalsError::InsufficientData { .. })),
        "expected insufficient data, got {:?}",
        result
    );
}
