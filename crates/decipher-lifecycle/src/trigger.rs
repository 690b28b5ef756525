//! Generation triggers: one-shot calls into the external research service.
//!
//! Research, mindmap and audio overview calls are fire-and-forget: a 2xx only
//! acknowledges the job, the result arrives later through the store. Chat is
//! plain request/response.

use std::time::Duration;

use async_trait::async_trait;
use decipher_core::{ArtifactKind, ChatRequest, DecipherError, NotebookId, ResearchRequest, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the research service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL, e.g. `http://localhost:8000/api`.
    pub base_url: String,

    /// Bearer token sent on every call, if set.
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Trait for the external generation service.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Queue main research for a notebook.
    async fn start_research(&self, request: &ResearchRequest) -> Result<()>;

    /// Queue generation of a derived artifact.
    async fn start_artifact(&self, notebook_id: NotebookId, kind: ArtifactKind) -> Result<()>;

    /// Answer a chat turn. The response body is returned verbatim.
    async fn chat(&self, request: &ChatRequest) -> Result<serde_json::Value>;
}

/// Path of the trigger endpoint for an artifact.
pub fn artifact_path(notebook_id: NotebookId, kind: ArtifactKind) -> String {
    format!("/research/{}/{}", kind.route_segment(), notebook_id)
}

pub const RESEARCH_PATH: &str = "/research";
pub const CHAT_PATH: &str = "/chat/message";

/// reqwest-backed implementation of GenerationService.
#[derive(Clone)]
pub struct HttpGenerationService {
    /// Base URL of the research service.
    base_url: String,

    /// Optional bearer token.
    api_key: Option<String>,

    /// HTTP client.
    http_client: reqwest::Client,
}

impl HttpGenerationService {
    /// Build a client from configuration.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DecipherError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Send and turn transport failures and non-2xx answers into `Upstream`.
    async fn send(&self, path: &str, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|e| DecipherError::Upstream {
            endpoint: path.to_string(),
            status: None,
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DecipherError::Upstream {
                endpoint: path.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        debug!(endpoint = path, status = status.as_u16(), "upstream call acknowledged");
        Ok(response)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn start_research(&self, request: &ResearchRequest) -> Result<()> {
        self.send(RESEARCH_PATH, self.request(RESEARCH_PATH).json(request))
            .await
            .map(|_| ())
    }

    async fn start_artifact(&self, notebook_id: NotebookId, kind: ArtifactKind) -> Result<()> {
        let path = artifact_path(notebook_id, kind);
        self.send(&path, self.request(&path)).await.map(|_| ())
    }

    async fn chat(&self, request: &ChatRequest) -> Result<serde_json::Value> {
        let response = self.send(CHAT_PATH, self.request(CHAT_PATH).json(request)).await?;
        response.json().await.map_err(|e| DecipherError::Upstream {
            endpoint: CHAT_PATH.to_string(),
            status: None,
            message: format!("invalid chat response: {e}"),
        })
    }
}
