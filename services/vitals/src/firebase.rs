//! Firebase Realtime Database report store

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::io::HttpClient;
use crate::store::ReportStore;

/// Report store backed by the Firebase Realtime Database REST API
pub struct FirebaseStore {
    database_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for FirebaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseStore")
            .field("database_url", &self.database_url)
            .finish()
    }
}

impl FirebaseStore {
    pub fn new(config: &StoreConfig, http: Arc<dyn HttpClient>) -> Self {
        let database_url = config.database_url.trim_end_matches('/').to_string();
        tracing::debug!("Created FirebaseStore at {}", database_url);
        Self { database_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl ReportStore for FirebaseStore {
    async fn set(&self, path: &str, value: serde_json::Value) -> crate::Result<()> {
        let response = self.http.put_json(&self.url(path), &value).await?;
        if !response.is_success() {
            return Err(crate::VitalsError::Store(format!(
                "PUT {} returned status {}: {}",
                path, response.status, response.body
            )));
        }
        Ok(())
    }

    async fn get(&self, path: &str) -> crate::Result<serde_json::Value> {
        let response = self.http.get(&self.url(path)).await?;
        if !response.is_success() {
            return Err(crate::VitalsError::Store(format!(
                "GET {} returned status {}: {}",
                path, response.status, response.body
            )));
        }
        let value = serde_json::from_str(&response.body)?;
        Ok(value)
    }
}
