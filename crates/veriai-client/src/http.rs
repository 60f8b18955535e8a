//! HTTP client for the VeriAI analysis backend.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use veriai_core::{AnalysisRequest, AnalysisResult, DashboardStats};

use crate::ClientError;
use crate::backend::{
    AnalyzeResponse, Backend, HistoryBackend, LatestResult, acknowledge, parse_history,
};

/// HTTP client for the backend's `/api/*` endpoints.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client for the given backend base URL.
    ///
    /// `base_url` should be like `http://127.0.0.1:5001` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into [`ClientError::Server`], otherwise decode its JSON body.
    async fn read_json(resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let resp = self.client.get(&url).send().await?;
        Self::read_json(resp).await
    }

    /// Submit a claim or URL for analysis.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, ClientError> {
        let url = self.url("/api/analyze");
        info!(url = %url, kind = ?request.kind(), "submitting analysis request");
        let resp = self.client.post(&url).json(&request.payload).send().await?;
        let body = Self::read_json(resp).await?;
        let response: AnalyzeResponse = serde_json::from_value(body)?;
        info!(status = ?response.status, "analysis request answered");
        Ok(response)
    }

    /// Fetch the most recently stored result, whichever submission produced it.
    pub async fn latest_result(&self) -> Result<LatestResult, ClientError> {
        let body = self.get_json("/api/latest_result").await?;
        LatestResult::from_value(body)
    }

    /// Fetch every stored result, newest first.
    pub async fn history(&self) -> Result<Vec<AnalysisResult>, ClientError> {
        let body = self.get_json("/api/history").await?;
        let items = parse_history(body)?;
        info!(count = items.len(), "loaded history");
        Ok(items)
    }

    /// Fetch aggregate dashboard counters.
    pub async fn stats(&self) -> Result<DashboardStats, ClientError> {
        let body = self.get_json("/api/stats").await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Remove every stored result.
    ///
    /// Returns the backend's confirmation message, if any.
    pub async fn clear_history(&self) -> Result<Option<String>, ClientError> {
        let url = self.url("/api/clear_history");
        info!(url = %url, "clearing history");
        let resp = self.client.post(&url).send().await?;
        acknowledge(Self::read_json(resp).await)
    }

    /// Remove one stored result by its `id`.
    pub async fn delete_history(&self, id: i64) -> Result<Option<String>, ClientError> {
        let url = self.url(&format!("/api/delete_history/{id}"));
        info!(url = %url, id, "deleting history item");
        let resp = self.client.delete(&url).send().await?;
        acknowledge(Self::read_json(resp).await)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, ClientError> {
        ApiClient::analyze(self, request).await
    }

    async fn latest_result(&self) -> Result<LatestResult, ClientError> {
        ApiClient::latest_result(self).await
    }
}

#[async_trait]
impl HistoryBackend for ApiClient {
    async fn history(&self) -> Result<Vec<AnalysisResult>, ClientError> {
        ApiClient::history(self).await
    }

    async fn clear_history(&self) -> Result<Option<String>, ClientError> {
        ApiClient::clear_history(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_client_trims_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:5001/".into());
        assert_eq!(client.base_url(), "http://127.0.0.1:5001");
        assert_eq!(
            client.url("/api/latest_result"),
            "http://127.0.0.1:5001/api/latest_result"
        );
    }

    #[test]
    fn with_timeout_builds() {
        let client =
            ApiClient::with_timeout("http://localhost:5001".into(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:5001");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Bind an ephemeral port, then free it so nothing is listening there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ApiClient::with_timeout(
            format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.history().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Transport);
    }
}
