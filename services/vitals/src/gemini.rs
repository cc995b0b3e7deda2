//! Gemini recommendation client

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::aggregator::Aggregate;
use crate::config::RecommendationConfig;
use crate::io::HttpClient;
use crate::recommend::{Recommendation, Recommender};

const DOCUMENT_PROMPT: &str = r#"You are a medical assistant.

You will receive a medical report PDF.
Your task is to:
1) Identify the patient's name if present.
2) Extract key health/lab parameters with their numeric values and units.
3) Give a short diet recommendation.
4) Suggest a suitable doctor category.
5) Add brief notes about overall condition.

Return ONLY a JSON object in this exact structure (no extra text):

{
  "patientName": "Full name of the patient, or empty string if unknown",
  "parameters": [
    { "name": "Hemoglobin", "value": "10.7", "unit": "g/dL", "flag": "low" }
  ],
  "dietRecommendation": "short, patient-friendly diet advice in 2-3 sentences",
  "doctorCategory": "what type of doctor the patient should consult",
  "notes": "brief additional notes about what to watch out for, in 2-4 sentences"
}
"#;

fn vitals_prompt(aggregate: &Aggregate) -> String {
    format!(
        r#"You are a medical assistant.

These vitals were averaged over a short live reading from a wearable sensor:
- SpO2: {:.1} %
- Body temperature: {:.1} °F
- ECG (relative amplitude): {:.2}
- GSR (relative skin conductance): {:.2}

Give a short diet recommendation, suggest a suitable doctor category and add
brief notes about what to watch out for.

Return ONLY a JSON object in this exact structure (no extra text):

{{
  "dietRecommendation": "short, patient-friendly diet advice in 2-3 sentences",
  "doctorCategory": "what type of doctor the patient should consult",
  "notes": "brief additional notes, in 2-4 sentences"
}}
"#,
        aggregate.spo2, aggregate.temperature, aggregate.ecg, aggregate.gsr
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Recommendation service backed by the Gemini `generateContent` API
pub struct GeminiRecommender {
    base_url: String,
    model: String,
    api_key: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for GeminiRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiRecommender")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiRecommender {
    pub fn new(config: &RecommendationConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!(
            "Created GeminiRecommender for model '{}' at {}",
            config.model,
            config.base_url
        );

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            http,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    async fn generate(&self, parts: serde_json::Value) -> crate::Result<Recommendation> {
        let body = serde_json::json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .http
            .post_json(&self.endpoint(), &body)
            .await
            .map_err(|e| crate::VitalsError::Recommendation(e.to_string()))?;
        if !response.is_success() {
            return Err(crate::VitalsError::Recommendation(format!(
                "Gemini API returned status {}: {}",
                response.status, response.body
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response.body)
            .map_err(|e| {
                crate::VitalsError::Recommendation(format!("Malformed Gemini response: {}", e))
            })?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(crate::VitalsError::Recommendation(
                "Gemini returned empty response".to_string(),
            ));
        }

        Ok(parse_recommendation(&text))
    }
}

/// Decode the model's answer, degrading to a notes-only result when it did
/// not return the requested JSON object.
pub fn parse_recommendation(text: &str) -> Recommendation {
    let object = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        Ok(other) => {
            tracing::warn!("Gemini answer is JSON but not an object: {}", other);
            return Recommendation::notes_only(text);
        }
        Err(e) => {
            tracing::warn!("Gemini answer is not JSON: {}", e);
            return Recommendation::notes_only(text);
        }
    };

    match serde_json::from_value::<Recommendation>(object) {
        Ok(rec) => rec,
        Err(e) => {
            tracing::warn!("Gemini answer is not a recommendation object: {}", e);
            Recommendation::notes_only(text)
        }
    }
}

#[async_trait]
impl Recommender for GeminiRecommender {
    async fn recommend_for_vitals(&self, aggregate: &Aggregate) -> crate::Result<Recommendation> {
        tracing::debug!("Requesting vitals recommendation from '{}'", self.model);
        self.generate(serde_json::json!([{ "text": vitals_prompt(aggregate) }]))
            .await
    }

    async fn recommend_for_document(&self, document: &[u8]) -> crate::Result<Recommendation> {
        tracing::debug!(
            "Requesting document recommendation from '{}' ({} bytes)",
            self.model,
            document.len()
        );
        let data = base64::engine::general_purpose::STANDARD.encode(document);
        self.generate(serde_json::json!([
            { "text": DOCUMENT_PROMPT },
            { "inlineData": { "mimeType": "application/pdf", "data": data } },
        ]))
        .await
    }
}
