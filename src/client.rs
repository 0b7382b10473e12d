//! Request adapter for the emotion-analysis backend.
//!
//! One POST per run, no retries, no timeout tuning. The response status is
//! always checked before the body is parsed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ViewError;
use crate::messages::{batch_warnings, AnalyzeRequest};
use crate::model::AnalysisResult;

/// Reply from the backend's `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Reply from the backend's `GET /health/model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub device: String,
    pub num_labels: u32,
    pub loaded: bool,
}

/// FastAPI-style error body: `{"detail": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the analysis route, e.g. `http://127.0.0.1:8000/analyze-chat`.
    pub endpoint: String,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

pub struct AnalysisClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send `messages` for analysis and return the validated result.
    ///
    /// # Returns
    /// - `Err(ViewError::Transport)` when the request never completes.
    /// - `Err(ViewError::Backend)` on a non-2xx status.
    /// - `Err(ViewError::Malformed)` when the body does not fit the schema.
    pub async fn analyze(&self, messages: &[String]) -> Result<AnalysisResult, ViewError> {
        for warning in batch_warnings(messages) {
            warn!(%warning, "sending batch the backend may reject");
        }

        let url = &self.config.endpoint;
        let body = AnalyzeRequest::new(messages.to_vec());
        debug!(url = %url, count = messages.len(), "posting messages for analysis");

        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ViewError::Transport {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| ViewError::Transport {
            url: url.clone(),
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            let detail = error_detail(&bytes);
            warn!(status = status.as_u16(), %detail, "analysis backend rejected request");
            return Err(ViewError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        let result = AnalysisResult::from_slice(&bytes, messages.len())?;
        info!(
            messages = messages.len(),
            emotions = result.emotion_distribution.len(),
            backend_ms = ?result.processing_time_ms,
            "analysis complete"
        );
        Ok(result)
    }

    /// Probe the backend root.
    pub async fn health(&self) -> Result<BackendHealth, ViewError> {
        self.get_json("/").await
    }

    /// Fetch model metadata from `/health/model`.
    pub async fn model_info(&self) -> Result<ModelInfo, ViewError> {
        self.get_json("/health/model").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ViewError> {
        let url = base_url(&self.config.endpoint)?.join(path).map_err(|e| {
            ViewError::Config(format!("cannot build {path} from endpoint: {e}"))
        })?;
        let url_s = url.to_string();

        let resp = self.client.get(url).send().await.map_err(|e| ViewError::Transport {
            url: url_s.clone(),
            detail: e.to_string(),
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| ViewError::Transport {
            url: url_s.clone(),
            detail: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(ViewError::Backend {
                status: status.as_u16(),
                detail: error_detail(&bytes),
            });
        }
        serde_json::from_slice(&bytes).map_err(|e| ViewError::Malformed(e.to_string()))
    }
}

/// Scheme + authority of `endpoint`, with the path stripped.
pub fn base_url(endpoint: &str) -> Result<reqwest::Url, ViewError> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| ViewError::Config(format!("invalid endpoint `{endpoint}`: {e}")))?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Best-effort human-readable message from an error body.
fn error_detail(bytes: &[u8]) -> String {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes) {
        return match body.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    if text.is_empty() {
        "no response body".to_string()
    } else {
        text
    }
}
