//! Recommendation service trait and result types

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregate;

/// One displayed health parameter, e.g. `{ "SpO₂", "97.5", "%", "" }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthParameter {
    pub name: String,
    pub value: String,
    pub unit: String,
    pub flag: String,
}

impl HealthParameter {
    pub fn new(name: &str, value: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            value: format!("{:.1}", value),
            unit: unit.to_string(),
            flag: String::new(),
        }
    }
}

/// Structured recommendation, also used as the presentation record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recommendation {
    pub patient_name: String,
    pub parameters: Vec<HealthParameter>,
    pub diet_recommendation: String,
    pub doctor_category: String,
    pub notes: String,
}

impl Recommendation {
    /// Fallback used when the service answered with something other than the
    /// expected JSON object.
    pub fn notes_only(text: impl Into<String>) -> Self {
        Self {
            notes: text.into(),
            ..Self::default()
        }
    }

    /// The four live channels formatted for display
    pub fn vitals_parameters(aggregate: &Aggregate) -> Vec<HealthParameter> {
        vec![
            HealthParameter::new("SpO₂", aggregate.spo2, "%"),
            HealthParameter::new("Temperature", aggregate.temperature, "°F"),
            HealthParameter::new("ECG", aggregate.ecg, "rel"),
            HealthParameter::new("GSR", aggregate.gsr, "rel"),
        ]
    }
}

/// Trait for the external recommendation service
#[async_trait]
pub trait Recommender: Send + Sync + std::fmt::Debug {
    /// Recommendation for averaged live vitals
    async fn recommend_for_vitals(&self, aggregate: &Aggregate) -> crate::Result<Recommendation>;

    /// Recommendation for an uploaded report document (PDF bytes)
    async fn recommend_for_document(&self, document: &[u8]) -> crate::Result<Recommendation>;
}

/// Await a recommendation call under `timeout`. Any failure of the call is
/// reported as a `Recommendation` error.
pub async fn bounded<F>(timeout: Duration, call: F) -> crate::Result<Recommendation>
where
    F: Future<Output = crate::Result<Recommendation>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(rec)) => Ok(rec),
        Ok(Err(e)) => {
            tracing::warn!("Recommendation service failed: {}", e);
            Err(match e {
                crate::VitalsError::Recommendation(_) => e,
                other => crate::VitalsError::Recommendation(other.to_string()),
            })
        }
        Err(_) => {
            tracing::warn!("Recommendation service timed out after {:?}", timeout);
            Err(crate::VitalsError::RecommendationTimeout(timeout))
        }
    }
}
