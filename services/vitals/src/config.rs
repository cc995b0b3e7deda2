//! Configuration types for the vitals service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when no API key is configured
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Sample retention and collection timings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_retention_horizon", with = "humantime_serde")]
    pub retention_horizon: Duration,
    #[serde(default = "default_collection_interval", with = "humantime_serde")]
    pub collection_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            retention_horizon: default_retention_horizon(),
            collection_interval: default_collection_interval(),
        }
    }
}

/// How overlapping collection sessions are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// Fail a new session while another one is collecting
    #[default]
    Reject,
    /// Queue a new session behind the active one
    Serialize,
    /// No guard: a second session's reset clears the first one's samples
    Unguarded,
}

/// Collection session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub policy: SessionPolicy,
}

/// Recommendation service (Gemini) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_vitals_timeout", with = "humantime_serde")]
    pub vitals_timeout: Duration,
    #[serde(default = "default_document_timeout", with = "humantime_serde")]
    pub document_timeout: Duration,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            api_key: String::new(),
            vitals_timeout: default_vitals_timeout(),
            document_timeout: default_document_timeout(),
        }
    }
}

/// Report store (Firebase Realtime Database) configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub database_url: String,
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_retention_horizon() -> Duration {
    Duration::from_secs(30)
}

fn default_collection_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_vitals_timeout() -> Duration {
    Duration::from_secs(45)
}

fn default_document_timeout() -> Duration {
    Duration::from_secs(90)
}

impl Config {
    /// Fill secrets from the environment and validate the result
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        self.resolve_secrets_with(|name| std::env::var(name).ok())
    }

    fn resolve_secrets_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<()> {
        if self.recommendation.api_key.is_empty() {
            self.recommendation.api_key = lookup(GEMINI_API_KEY_ENV).unwrap_or_default();
        }
        if self.recommendation.api_key.is_empty() {
            return Err(crate::VitalsError::Config(format!(
                "{} env var is not set and no api_key is configured",
                GEMINI_API_KEY_ENV
            )));
        }
        if self.store.enabled && self.store.database_url.is_empty() {
            return Err(crate::VitalsError::Config(
                "store is enabled but database_url is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::VitalsError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
