//! Vitals - live telemetry aggregation service
//!
//! Buffers samples pushed by a wearable sensor, averages them over a short
//! collection window on request and asks a recommendation service for advice
//! on the result.

pub mod aggregator;
pub mod api;
pub mod buffer;
pub mod config;
pub mod error;
pub mod firebase;
pub mod gemini;
pub mod ingest;
pub mod io;
pub mod recommend;
pub mod report;
pub mod session;
pub mod store;

pub use aggregator::{Aggregate, WindowAggregator};
pub use buffer::{Sample, SampleBuffer};
pub use config::{load_config, Config, SessionPolicy};
pub use error::{Result, VitalsError};
pub use ingest::{Ingestor, SamplePayload};
pub use recommend::{HealthParameter, Recommendation, Recommender};
pub use session::{SessionOrchestrator, SessionSettings};
pub use store::{MemoryStore, ReportStore};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::AppState;
use crate::firebase::FirebaseStore;
use crate::gemini::GeminiRecommender;
use crate::io::{HttpClient, ReqwestHttpClient};

/// Builder for the vitals HTTP service.
///
/// Collaborators default to the Gemini recommender and, when enabled in the
/// configuration, the Firebase report store.
pub struct VitalsBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    recommender: Option<Arc<dyn Recommender>>,
    store: Option<Arc<dyn ReportStore>>,
}

impl VitalsBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            recommender: None,
            store: None,
        }
    }

    pub fn with_http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Wire up the service and bind its listener
    pub async fn build(self) -> Result<BoundServer> {
        let config = self.config;
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        let recommender = self.recommender.unwrap_or_else(|| {
            Arc::new(GeminiRecommender::new(
                &config.recommendation,
                Arc::clone(&http),
            ))
        });

        let store = match self.store {
            Some(store) => Some(store),
            None if config.store.enabled => Some(Arc::new(FirebaseStore::new(
                &config.store,
                Arc::clone(&http),
            )) as Arc<dyn ReportStore>),
            None => None,
        };

        let buffer = Arc::new(SampleBuffer::new(config.telemetry.retention_horizon));
        let cancel = CancellationToken::new();

        let mut sessions = SessionOrchestrator::new(
            Arc::clone(&buffer),
            Arc::clone(&recommender),
            SessionSettings::from_config(&config),
            cancel.clone(),
        );
        if let Some(store) = &store {
            sessions = sessions.with_store(Arc::clone(store));
        }
        tracing::debug!("Session settings: {:?}", sessions.settings());

        let state = AppState {
            ingestor: Ingestor::new(buffer),
            sessions: Arc::new(sessions),
            recommender,
            store,
            document_timeout: config.recommendation.document_timeout,
        };
        let router =
            api::build_router(state).layer(api::cors_layer(&config.server.cors_origin)?);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Bound vitals server bound_addr={}", listener.local_addr()?);

        Ok(BoundServer {
            listener,
            router,
            cancel,
        })
    }
}

/// A bound, not yet serving, vitals server
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
}

impl BoundServer {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Token that stops the server and any collection session in progress
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Serve until ctrl-c or cancellation
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!("Failed to listen for ctrl-c: {}", e);
                        return;
                    }
                    tracing::info!("Shutdown signal received");
                    cancel_for_signal.cancel();
                }
                _ = cancel_for_signal.cancelled() => {}
            }
        });

        tracing::info!("Vitals service started");
        let cancel = self.cancel.clone();
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("Vitals service stopped");
        Ok(())
    }
}
