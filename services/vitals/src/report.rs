//! Persisted report records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregate;
use crate::recommend::Recommendation;
use crate::store::ReportStore;

const REPORTS_PATH: &str = "reports";

/// Where a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Averaged live vitals from a collection session
    Live,
    /// An uploaded report document
    Document,
}

/// A report as stored under `reports/<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source: ReportSource,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub spo2: Option<f64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub ecg: Option<f64>,
    #[serde(default)]
    pub gsr: Option<f64>,
    #[serde(default)]
    pub diet_recommendation: String,
    #[serde(default)]
    pub doctor_category: String,
    #[serde(default)]
    pub notes: String,
}

impl Report {
    fn from_recommendation(source: ReportSource, rec: &Recommendation) -> Self {
        Self {
            id: String::new(),
            created_at: Utc::now(),
            source,
            patient_name: rec.patient_name.clone(),
            spo2: None,
            temp: None,
            ecg: None,
            gsr: None,
            diet_recommendation: rec.diet_recommendation.clone(),
            doctor_category: rec.doctor_category.clone(),
            notes: rec.notes.clone(),
        }
    }

    /// Report for a finished collection session
    pub fn live(aggregate: &Aggregate, rec: &Recommendation) -> Self {
        Self {
            spo2: Some(aggregate.spo2),
            temp: Some(aggregate.temperature),
            ecg: Some(aggregate.ecg),
            gsr: Some(aggregate.gsr),
            ..Self::from_recommendation(ReportSource::Live, rec)
        }
    }

    /// Report for an uploaded document
    pub fn document(rec: &Recommendation) -> Self {
        Self::from_recommendation(ReportSource::Document, rec)
    }
}

/// Store a report, assigning its id from the creation time when unset
pub async fn save_report(store: &dyn ReportStore, report: &mut Report) -> crate::Result<()> {
    if report.id.is_empty() {
        report.id = report.created_at.format("%Y%m%d%H%M%S").to_string();
    }
    let path = format!("{}/{}", REPORTS_PATH, report.id);
    store.set(&path, serde_json::to_value(&*report)?).await?;
    tracing::debug!("Saved report {}", path);
    Ok(())
}

/// Most recently created report, skipping entries that do not decode
pub async fn latest_report(store: &dyn ReportStore) -> crate::Result<Option<Report>> {
    let raw = store.get(REPORTS_PATH).await?;
    let entries = match raw {
        serde_json::Value::Object(entries) => entries,
        serde_json::Value::Null => return Ok(None),
        other => {
            return Err(crate::VitalsError::Store(format!(
                "unexpected value at {}: {}",
                REPORTS_PATH, other
            )))
        }
    };

    let mut latest: Option<Report> = None;
    for (id, blob) in entries {
        let mut report: Report = match serde_json::from_value(blob) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Skipping invalid report entry {}: {}", id, e);
                continue;
            }
        };
        report.id = id;

        if latest
            .as_ref()
            .is_none_or(|l| report.created_at > l.created_at)
        {
            latest = Some(report);
        }
    }

    Ok(latest)
}
