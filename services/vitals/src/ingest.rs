//! Ingestion of single samples pushed by the sensor device

use std::sync::Arc;

use serde::Deserialize;

use crate::buffer::{Sample, SampleBuffer};

/// Body of `POST /esp-sample`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SamplePayload {
    pub spo2: f64,
    pub temp: f64,
    pub ecg: f64,
    pub gsr: f64,
}

impl SamplePayload {
    /// Parse a JSON request body. Every field is required and must be a number.
    pub fn parse(body: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| crate::VitalsError::Validation(format!("Invalid JSON body: {}", e)))
    }
}

/// Stateless entry point that stamps payloads and appends them to the buffer
#[derive(Debug, Clone)]
pub struct Ingestor {
    buffer: Arc<SampleBuffer>,
}

impl Ingestor {
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        Self { buffer }
    }

    /// Stamp the payload with the receipt time and append it
    pub async fn ingest(&self, payload: SamplePayload) -> Sample {
        let sample = Sample::now(payload.spo2, payload.temp, payload.ecg, payload.gsr);
        self.buffer.append(sample).await;
        tracing::debug!(
            "Ingested sample spo2={} temp={} ecg={} gsr={}",
            sample.spo2,
            sample.temperature,
            sample.ecg,
            sample.gsr
        );
        sample
    }

    /// Parse a raw body and ingest it. Malformed bodies leave the buffer untouched.
    pub async fn ingest_body(&self, body: &[u8]) -> crate::Result<Sample> {
        let payload = SamplePayload::parse(body).inspect_err(|e| {
            tracing::debug!("Rejected sample: {}", e);
        })?;
        Ok(self.ingest(payload).await)
    }
}
