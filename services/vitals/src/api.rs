//! HTTP routes for sample ingestion, live reads and report uploads

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::ingest::Ingestor;
use crate::recommend::{bounded, Recommendation, Recommender};
use crate::report::{latest_report, save_report, Report};
use crate::session::SessionOrchestrator;
use crate::store::ReportStore;

/// Largest accepted report upload
pub const MAX_UPLOAD_BYTES: usize = 20 << 20;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Ingestor,
    pub sessions: Arc<SessionOrchestrator>,
    pub recommender: Arc<dyn Recommender>,
    pub store: Option<Arc<dyn ReportStore>>,
    pub document_timeout: Duration,
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/esp-sample", post(sample_handler))
        .route("/live-read", post(live_read_handler))
        .route(
            "/upload-report",
            post(upload_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/reports/latest", get(latest_report_handler))
        .with_state(state)
}

/// CORS policy for the browser frontend at `origin`
pub fn cors_layer(origin: &str) -> crate::Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| crate::VitalsError::Config(format!("Invalid CORS origin '{}': {}", origin, e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Vitals service is running",
    }))
}

async fn sample_handler(
    State(app): State<AppState>,
    body: Bytes,
) -> crate::Result<Json<serde_json::Value>> {
    app.ingestor.ingest_body(&body).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveReadRequest {
    #[serde(default)]
    patient_name: String,
}

async fn live_read_handler(
    State(app): State<AppState>,
    body: Bytes,
) -> crate::Result<Json<Recommendation>> {
    let request: LiveReadRequest = serde_json::from_slice(&body)
        .map_err(|e| crate::VitalsError::Validation(format!("Invalid JSON body: {}", e)))?;
    let record = app.sessions.run(&request.patient_name).await?;
    Ok(Json(record))
}

async fn upload_handler(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> crate::Result<Json<Recommendation>> {
    let document = read_file_field(&mut multipart).await?;
    tracing::info!("Received report upload ({} bytes)", document.len());

    let rec = bounded(
        app.document_timeout,
        app.recommender.recommend_for_document(&document),
    )
    .await?;

    if let Some(store) = &app.store {
        let mut report = Report::document(&rec);
        if let Err(e) = save_report(store.as_ref(), &mut report).await {
            tracing::warn!("Failed to save uploaded report: {}", e);
        }
    }

    Ok(Json(rec))
}

async fn read_file_field(multipart: &mut Multipart) -> crate::Result<Bytes> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        crate::VitalsError::Validation(format!("Failed to parse form: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some("file") {
            continue;
        }
        let data = field.bytes().await.map_err(invalid)?;
        if data.is_empty() {
            return Err(crate::VitalsError::Validation(
                "Uploaded file is empty".to_string(),
            ));
        }
        return Ok(data);
    }

    Err(crate::VitalsError::Validation(
        "Missing file field".to_string(),
    ))
}

async fn latest_report_handler(State(app): State<AppState>) -> crate::Result<Json<Report>> {
    let store = app
        .store
        .as_ref()
        .ok_or_else(|| crate::VitalsError::NotFound("No report store configured".to_string()))?;
    let report = latest_report(store.as_ref())
        .await?
        .ok_or_else(|| crate::VitalsError::NotFound("No reports found".to_string()))?;
    Ok(Json(report))
}
