//! HTTP client abstraction for testability

use async_trait::async_trait;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a PUT request with a JSON body
    async fn put_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &serde_json::Value)
        -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Strip the query string so API keys never reach the logs
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

async fn into_response(
    method: &str,
    url: &str,
    response: reqwest::Response,
) -> crate::Result<HttpResponse> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| crate::VitalsError::Http(format!("Reading response body: {}", e)))?;

    tracing::debug!(
        "{} {} -> {} ({} bytes)",
        method,
        redact(url),
        status,
        body.len()
    );
    Ok(HttpResponse { status, body })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", redact(url));
        let response = self.client.get(url).send().await.map_err(|e| {
            crate::VitalsError::Http(format!("GET {} failed: {}", redact(url), e.without_url()))
        })?;
        into_response("GET", url, response).await
    }

    async fn put_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse> {
        tracing::debug!("PUT {}", redact(url));
        let response = self.client.put(url).json(body).send().await.map_err(|e| {
            crate::VitalsError::Http(format!("PUT {} failed: {}", redact(url), e.without_url()))
        })?;
        into_response("PUT", url, response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", redact(url));
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            crate::VitalsError::Http(format!("POST {} failed: {}", redact(url), e.without_url()))
        })?;
        into_response("POST", url, response).await
    }
}
