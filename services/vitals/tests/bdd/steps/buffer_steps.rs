//! BDD step definitions for the sample buffer feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use vitals::{Sample, SampleBuffer};

use crate::world::VitalsWorld;

#[given(expr = "a sample buffer with a {int} second retention horizon")]
fn buffer_with_horizon(world: &mut VitalsWorld, secs: u64) {
    world.buffer = Some(Arc::new(SampleBuffer::new(Duration::from_secs(secs))));
}

#[when(expr = "a sample with SpO2 {float} arrives at {int} seconds")]
async fn sample_arrives_at(world: &mut VitalsWorld, spo2: f64, secs: u64) {
    let at = world.origin() + Duration::from_secs(secs);
    let buffer = world.buffer();
    buffer
        .append_at(Sample::at(at, spo2, 98.6, 0.5, 0.2), at)
        .await;
}

#[when("the buffer is reset")]
async fn buffer_is_reset(world: &mut VitalsWorld) {
    world.buffer().reset().await;
}

#[when(expr = "the buffer is reset and {int} samples arrive concurrently")]
async fn reset_then_concurrent_samples(world: &mut VitalsWorld, count: usize) {
    let buffer = world.buffer();
    buffer.reset().await;

    let handles: Vec<_> = (0..count)
        .map(|i| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                buffer.append(Sample::now(90.0 + i as f64, 98.6, 0.5, 0.2)).await;
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[then(expr = "the buffer holds {int} samples")]
async fn buffer_holds(world: &mut VitalsWorld, count: usize) {
    assert_eq!(world.buffer().len().await, count);
}

#[then(expr = "the oldest buffered SpO2 is {float}")]
async fn oldest_spo2(world: &mut VitalsWorld, spo2: f64) {
    let samples = world.buffer().snapshot_within(Duration::MAX).await;
    let oldest = samples.first().expect("buffer is empty");
    assert_eq!(oldest.spo2, spo2);
}
