//! BDD test world for the vitals service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cucumber::World;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use vitals::{Aggregate, Recommendation, Recommender, SampleBuffer, SessionOrchestrator};

/// Recommender double that records the aggregates it receives
#[derive(Debug)]
pub struct RecordingRecommender {
    pub fail: bool,
    pub seen: Mutex<Vec<Aggregate>>,
}

impl RecordingRecommender {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Recommender for RecordingRecommender {
    async fn recommend_for_vitals(&self, aggregate: &Aggregate) -> vitals::Result<Recommendation> {
        self.seen.lock().await.push(*aggregate);
        if self.fail {
            return Err(vitals::VitalsError::Recommendation(
                "quota exceeded".to_string(),
            ));
        }
        Ok(Recommendation {
            diet_recommendation: "Stay hydrated".to_string(),
            doctor_category: "General Physician".to_string(),
            notes: "Vitals look stable".to_string(),
            ..Recommendation::default()
        })
    }

    async fn recommend_for_document(&self, _document: &[u8]) -> vitals::Result<Recommendation> {
        unreachable!("document recommendations are not exercised by the BDD suite")
    }
}

#[derive(Debug, Default, World)]
pub struct VitalsWorld {
    // Buffer testing
    pub buffer: Option<Arc<SampleBuffer>>,
    pub clock_origin: Option<Instant>,

    // Aggregation testing
    pub aggregate_result: Option<vitals::Result<Aggregate>>,

    // Session testing
    pub collection_interval: Option<Duration>,
    pub recommender: Option<Arc<RecordingRecommender>>,
    pub orchestrator: Option<Arc<SessionOrchestrator>>,
    pub session: Option<JoinHandle<vitals::Result<Recommendation>>>,
    pub session_result: Option<vitals::Result<Recommendation>>,
    pub overlapping_result: Option<vitals::Result<Recommendation>>,
}

impl VitalsWorld {
    pub fn buffer(&mut self) -> Arc<SampleBuffer> {
        Arc::clone(
            self.buffer
                .get_or_insert_with(|| Arc::new(SampleBuffer::default())),
        )
    }

    /// Fixed reference point for scenarios that place samples on a timeline
    pub fn origin(&mut self) -> Instant {
        *self.clock_origin.get_or_insert_with(Instant::now)
    }
}
