//! Shared buffer of recent vitals samples
//!
//! The buffer keeps a short rolling history of samples pushed by the sensor
//! device. Stale samples are evicted lazily on every append, so the buffer
//! never needs a background task.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// A single timestamped reading of the four monitored channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Instant,
    pub spo2: f64,
    pub temperature: f64,
    pub ecg: f64,
    pub gsr: f64,
}

impl Sample {
    /// Create a sample stamped with the current time
    pub fn now(spo2: f64, temperature: f64, ecg: f64, gsr: f64) -> Self {
        Self::at(Instant::now(), spo2, temperature, ecg, gsr)
    }

    pub fn at(timestamp: Instant, spo2: f64, temperature: f64, ecg: f64, gsr: f64) -> Self {
        Self {
            timestamp,
            spo2,
            temperature,
            ecg,
            gsr,
        }
    }
}

/// Mutually exclusive store of recent samples with time-based eviction
///
/// Every operation takes the single internal lock for its whole duration and
/// releases it before returning, so append, reset and snapshot never
/// interleave. Callers only ever receive copies of the stored samples.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Mutex<Vec<Sample>>,
    retention_horizon: Duration,
}

impl SampleBuffer {
    pub fn new(retention_horizon: Duration) -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            retention_horizon,
        }
    }

    /// Append a sample and evict everything older than the retention horizon
    pub async fn append(&self, sample: Sample) {
        self.append_at(sample, Instant::now()).await;
    }

    /// Append a sample, evicting relative to the given `now`
    pub async fn append_at(&self, sample: Sample, now: Instant) {
        let cutoff = cutoff(now, self.retention_horizon);
        let mut samples = self.samples.lock().await;
        samples.push(sample);
        let before = samples.len();
        samples.retain(|s| is_fresh(s, cutoff));
        let evicted = before - samples.len();
        if evicted > 0 {
            tracing::debug!(
                "Evicted {} stale samples, {} retained",
                evicted,
                samples.len()
            );
        }
    }

    /// Discard all samples. Samples appended after this call are kept.
    pub async fn reset(&self) {
        let mut samples = self.samples.lock().await;
        *samples = Vec::new();
    }

    /// Copy of all samples no older than `window`. Does not evict.
    pub async fn snapshot_within(&self, window: Duration) -> Vec<Sample> {
        self.snapshot_within_at(window, Instant::now()).await
    }

    pub async fn snapshot_within_at(&self, window: Duration, now: Instant) -> Vec<Sample> {
        let cutoff = cutoff(now, window);
        let samples = self.samples.lock().await;
        samples
            .iter()
            .filter(|s| is_fresh(s, cutoff))
            .copied()
            .collect()
    }

    /// Number of samples currently retained
    pub async fn len(&self) -> usize {
        self.samples.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn retention_horizon(&self) -> Duration {
        self.retention_horizon
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Oldest timestamp still inside `window` as seen from `now`, or `None` when
/// the window reaches back past the clock's origin and nothing can be stale.
fn cutoff(now: Instant, window: Duration) -> Option<Instant> {
    now.checked_sub(window)
}

fn is_fresh(sample: &Sample, cutoff: Option<Instant>) -> bool {
    cutoff.is_none_or(|cutoff| sample.timestamp >= cutoff)
}
