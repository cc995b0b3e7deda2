//! Collection session: reset, collect, aggregate, recommend

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::aggregator::{Aggregate, WindowAggregator};
use crate::buffer::SampleBuffer;
use crate::config::{Config, SessionPolicy};
use crate::recommend::{bounded, Recommendation, Recommender};
use crate::report::{save_report, Report};
use crate::store::ReportStore;

/// Timings and overlap policy for collection sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub collection_interval: Duration,
    pub recommendation_timeout: Duration,
    pub policy: SessionPolicy,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            collection_interval: config.telemetry.collection_interval,
            recommendation_timeout: config.recommendation.vitals_timeout,
            policy: config.session.policy,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs one windowed collection cycle per request
///
/// The sample buffer lock is only taken inside the buffer's own operations,
/// so ingestion stays fully concurrent with a session that is waiting for
/// samples or for the recommendation service.
pub struct SessionOrchestrator {
    buffer: Arc<SampleBuffer>,
    aggregator: WindowAggregator,
    recommender: Arc<dyn Recommender>,
    store: Option<Arc<dyn ReportStore>>,
    settings: SessionSettings,
    session_lock: Mutex<()>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("settings", &self.settings)
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl SessionOrchestrator {
    pub fn new(
        buffer: Arc<SampleBuffer>,
        recommender: Arc<dyn Recommender>,
        settings: SessionSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            aggregator: WindowAggregator::new(Arc::clone(&buffer)),
            buffer,
            recommender,
            store: None,
            settings,
            session_lock: Mutex::new(()),
            cancel,
        }
    }

    /// Persist a report for every successful session
    pub fn with_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Run a full session for `patient_name` and return the presentation record
    pub async fn run(&self, patient_name: &str) -> crate::Result<Recommendation> {
        let _guard = self.acquire().await?;
        tracing::info!(
            "Starting collection session for '{}' ({:?})",
            patient_name,
            self.settings.collection_interval
        );

        let aggregate = match self.collect().await {
            Ok(aggregate) => aggregate,
            Err(e) => {
                tracing::info!("Collection session for '{}' aborted: {}", patient_name, e);
                return Err(e);
            }
        };

        let rec = self.recommend(&aggregate).await?;
        let presentation = Recommendation {
            patient_name: patient_name.to_string(),
            parameters: Recommendation::vitals_parameters(&aggregate),
            ..rec
        };

        self.persist(&aggregate, &presentation).await;
        tracing::info!(
            "Collection session for '{}' finished with {} samples",
            patient_name,
            aggregate.sample_count
        );
        Ok(presentation)
    }

    async fn acquire(&self) -> crate::Result<Option<MutexGuard<'_, ()>>> {
        match self.settings.policy {
            SessionPolicy::Reject => match self.session_lock.try_lock() {
                Ok(guard) => Ok(Some(guard)),
                Err(_) => {
                    tracing::debug!("Rejecting overlapping collection session");
                    Err(crate::VitalsError::SessionBusy)
                }
            },
            SessionPolicy::Serialize => Ok(Some(self.session_lock.lock().await)),
            SessionPolicy::Unguarded => Ok(None),
        }
    }

    /// Reset the buffer, wait out the collection interval, then average it
    async fn collect(&self) -> crate::Result<Aggregate> {
        let interval = self.settings.collection_interval;
        self.buffer.reset().await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = self.cancel.cancelled() => {
                tracing::debug!("Collection session cancelled while waiting for samples");
                return Err(crate::VitalsError::Cancelled);
            }
        }

        self.aggregator.average(interval).await
    }

    async fn recommend(&self, aggregate: &Aggregate) -> crate::Result<Recommendation> {
        let call = bounded(
            self.settings.recommendation_timeout,
            self.recommender.recommend_for_vitals(aggregate),
        );

        tokio::select! {
            result = call => result,
            _ = self.cancel.cancelled() => Err(crate::VitalsError::Cancelled),
        }
    }

    async fn persist(&self, aggregate: &Aggregate, presentation: &Recommendation) {
        let Some(store) = &self.store else {
            return;
        };
        let mut report = Report::live(aggregate, presentation);
        if let Err(e) = save_report(store.as_ref(), &mut report).await {
            tracing::warn!("Failed to save live report: {}", e);
        }
    }
}
