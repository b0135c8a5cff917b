use super::{Backend, QueryRequest};
use crate::{Result, StudioError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/query";

/// JSON-over-HTTP backend
pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StudioError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn query(&self, request: &QueryRequest) -> Result<serde_json::Value> {
        debug!("POST {} (mode {})", self.url, request.mode);

        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Backend answered with status {}", status);
            return Err(StudioError::BackendError(format!(
                "Request failed with status: {}",
                status
            )));
        }

        let body = response.json::<serde_json::Value>().await?;
        Ok(body)
    }
}
