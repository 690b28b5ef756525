//! Decipher client implementation.

use async_trait::async_trait;
use decipher_core::{
    ArtifactKind, ChatMessage, ChatRequest, CreateNotebookRequest, DecipherError, NotebookDetails,
    NotebookId, NotebookSummary, Result, Source, SourceInput, UpdateSourcesRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// What a view needs from the node to drive its pollers.
#[async_trait]
pub trait NotebookApi: Send + Sync {
    /// Read one notebook, as the pollers see it.
    async fn fetch_notebook(&self, id: NotebookId) -> Result<NotebookDetails>;

    /// Ask the node to start generating a derived artifact.
    async fn generate_artifact(&self, id: NotebookId, kind: ArtifactKind) -> Result<GenerationAccepted>;

    /// Re-queue main processing.
    async fn retry_notebook(&self, id: NotebookId) -> Result<()>;
}

/// Node answer to a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAccepted {
    pub artifact: ArtifactKind,
    pub state: String,
    pub already_in_progress: bool,
}

/// Error body returned by the node.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    sources: Vec<Source>,
}

/// Client for the notebook API of a Decipher node.
#[derive(Clone)]
pub struct DecipherClient {
    /// Base URL of the node.
    base_url: String,

    /// Session token sent as a bearer credential.
    token: String,

    /// HTTP client.
    http_client: reqwest::Client,
}

impl DecipherClient {
    /// Create a client without contacting the node.
    pub fn new(url: &str, token: impl Into<String>) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            token: token.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client and check that the node answers its health check.
    pub async fn connect(url: &str, token: impl Into<String>) -> Result<Self> {
        let client = Self::new(url, token);
        client
            .http_client
            .get(format!("{}/health", client.base_url))
            .send()
            .await
            .map_err(|e| DecipherError::Connection(e.to_string()))?
            .error_for_status()
            .map_err(|e| DecipherError::Connection(e.to_string()))?;
        Ok(client)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, path: &str, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| DecipherError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
        let message = body
            .as_ref()
            .map(|b| b.error.clone())
            .unwrap_or_else(|| text.clone());

        Err(match status.as_u16() {
            401 => DecipherError::Unauthorized,
            404 => DecipherError::NotFound {
                resource: "Notebook".to_string(),
                id: path.to_string(),
            },
            400 | 422 => DecipherError::validation(message),
            409 => DecipherError::precondition(message),
            502 => DecipherError::Upstream {
                endpoint: path.to_string(),
                status: Some(502),
                message: body.and_then(|b| b.details).unwrap_or(message),
            },
            code => DecipherError::Internal(format!("{path} returned {code}: {message}")),
        })
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| DecipherError::Serialization(e.to_string()))
    }

    /// Create a notebook.
    pub async fn create_notebook(&self, request: &CreateNotebookRequest) -> Result<NotebookDetails> {
        let path = "/api/notebooks";
        let response = self
            .send(path, self.request(reqwest::Method::POST, path).json(request))
            .await?;
        Self::json(response).await
    }

    /// List the caller's notebooks, newest first.
    pub async fn list_notebooks(&self) -> Result<Vec<NotebookSummary>> {
        let path = "/api/notebooks";
        let response = self.send(path, self.request(reqwest::Method::GET, path)).await?;
        Self::json(response).await
    }

    /// Get a notebook by ID.
    pub async fn get_notebook(&self, id: NotebookId) -> Result<NotebookDetails> {
        let path = format!("/api/notebooks/{id}");
        let response = self.send(&path, self.request(reqwest::Method::GET, &path)).await?;
        Self::json(response).await
    }

    /// Delete a notebook.
    pub async fn delete_notebook(&self, id: NotebookId) -> Result<()> {
        let path = format!("/api/notebooks/{id}");
        self.send(&path, self.request(reqwest::Method::DELETE, &path))
            .await
            .map(|_| ())
    }

    /// Replace all sources of a notebook.
    pub async fn update_sources(&self, id: NotebookId, sources: Vec<SourceInput>) -> Result<Vec<Source>> {
        let path = format!("/api/notebooks/{id}/sources");
        let body = UpdateSourcesRequest { sources };
        let response = self
            .send(&path, self.request(reqwest::Method::PATCH, &path).json(&body))
            .await?;
        let parsed: SourcesResponse = Self::json(response).await?;
        Ok(parsed.sources)
    }

    /// Re-queue main processing.
    pub async fn retry(&self, id: NotebookId) -> Result<()> {
        let path = format!("/api/notebooks/{id}/retry");
        self.send(&path, self.request(reqwest::Method::POST, &path))
            .await
            .map(|_| ())
    }

    /// Start generating a mindmap or audio overview.
    pub async fn generate(&self, id: NotebookId, kind: ArtifactKind) -> Result<GenerationAccepted> {
        let path = format!("/api/notebooks/{id}/{}", kind.route_segment());
        let response = self.send(&path, self.request(reqwest::Method::POST, &path)).await?;
        Self::json(response).await
    }

    /// Ask a question about a notebook. The answer is returned verbatim.
    ///
    /// Chat errors come back as `{status: "error", response}` with a non-2xx
    /// code, so they are decoded here rather than through the common path.
    pub async fn chat(&self, id: NotebookId, messages: Vec<ChatMessage>) -> Result<serde_json::Value> {
        let path = "/api/chat";
        let body = ChatRequest {
            messages,
            notebook_id: id,
        };
        let response = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await
            .map_err(|e| DecipherError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Self::json(response).await;
        }

        // Not always the chat envelope: a proxy may answer with plain text.
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|value| value["response"].as_str().map(str::to_string))
            .unwrap_or(text);
        Err(match status.as_u16() {
            401 => DecipherError::Unauthorized,
            404 => DecipherError::notebook_not_found(id),
            400 => DecipherError::validation(message),
            code => DecipherError::Upstream {
                endpoint: path.to_string(),
                status: Some(code),
                message,
            },
        })
    }
}

#[async_trait]
impl NotebookApi for DecipherClient {
    async fn fetch_notebook(&self, id: NotebookId) -> Result<NotebookDetails> {
        self.get_notebook(id).await
    }

    async fn generate_artifact(&self, id: NotebookId, kind: ArtifactKind) -> Result<GenerationAccepted> {
        self.generate(id, kind).await
    }

    async fn retry_notebook(&self, id: NotebookId) -> Result<()> {
        self.retry(id).await
    }
}
