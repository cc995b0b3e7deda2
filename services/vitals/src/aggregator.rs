//! Time-windowed mean over the sample buffer
//!
//! The mean is the plain arithmetic average of whatever samples arrived in
//! the window. Irregular arrival spacing is not corrected for.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::buffer::{Sample, SampleBuffer};

/// Per-channel means over a time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// When the aggregate was computed
    pub timestamp: Instant,
    pub sample_count: usize,
    pub spo2: f64,
    pub temperature: f64,
    pub ecg: f64,
    pub gsr: f64,
}

impl Aggregate {
    /// Unweighted mean of `samples`, or `None` when there are none
    pub fn from_samples(samples: &[Sample], timestamp: Instant) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        // Running mean so large finite inputs cannot overflow a sum
        let mut mean = (0.0, 0.0, 0.0, 0.0);
        for (i, s) in samples.iter().enumerate() {
            let k = (i + 1) as f64;
            mean.0 += (s.spo2 - mean.0) / k;
            mean.1 += (s.temperature - mean.1) / k;
            mean.2 += (s.ecg - mean.2) / k;
            mean.3 += (s.gsr - mean.3) / k;
        }

        Some(Self {
            timestamp,
            sample_count: samples.len(),
            spo2: mean.0,
            temperature: mean.1,
            ecg: mean.2,
            gsr: mean.3,
        })
    }
}

/// Computes averages over the shared sample buffer
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    buffer: Arc<SampleBuffer>,
}

impl WindowAggregator {
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        Self { buffer }
    }

    /// Average of all samples no older than `window`
    pub async fn average(&self, window: Duration) -> crate::Result<Aggregate> {
        let now = Instant::now();
        let snapshot = self.buffer.snapshot_within_at(window, now).await;
        let aggregate = Aggregate::from_samples(&snapshot, now)
            .ok_or(crate::VitalsError::InsufficientData { window })?;

        tracing::debug!(
            "Averaged {} samples over {:?}: spo2={:.1} temp={:.1} ecg={:.2} gsr={:.2}",
            aggregate.sample_count,
            window,
            aggregate.spo2,
            aggregate.temperature,
            aggregate.ecg,
            aggregate.gsr
        );
        Ok(aggregate)
    }
}
