//! Test doubles for the generation service and the store.

use std::sync::Arc;

use async_trait::async_trait;
use decipher_core::{
    ArtifactKind, ArtifactState, ChatRequest, DecipherError, Faq, NotebookDetails, NotebookId,
    NotebookSummary, ResearchRequest, Result, Source, SourceKind, StatusRecord, UserId,
};
use decipher_store::{ArtifactClaim, ArtifactStore, InMemoryArtifactStore, NewNotebook};
use tokio::sync::Mutex;

/// Records every call; fails them all when built with [`RecordingGenerator::failing`].
#[derive(Default)]
pub struct RecordingGenerator {
    fail: bool,
    research: Mutex<Vec<ResearchRequest>>,
    artifacts: Mutex<Vec<(NotebookId, ArtifactKind)>>,
    chats: Mutex<Vec<ChatRequest>>,
}

impl RecordingGenerator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn research_calls(&self) -> Vec<ResearchRequest> {
        self.research.lock().await.clone()
    }

    pub async fn artifact_calls(&self) -> Vec<(NotebookId, ArtifactKind)> {
        self.artifacts.lock().await.clone()
    }

    pub async fn chat_calls(&self) -> Vec<ChatRequest> {
        self.chats.lock().await.clone()
    }

    fn outcome(&self, endpoint: &str) -> Result<()> {
        if self.fail {
            Err(DecipherError::Upstream {
                endpoint: endpoint.to_string(),
                status: Some(503),
                message: "service unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl crate::GenerationService for RecordingGenerator {
    async fn start_research(&self, request: &ResearchRequest) -> Result<()> {
        self.research.lock().await.push(request.clone());
        self.outcome("/research")
    }

    async fn start_artifact(&self, notebook_id: NotebookId, kind: ArtifactKind) -> Result<()> {
        self.artifacts.lock().await.push((notebook_id, kind));
        self.outcome(kind.route_segment())
    }

    async fn chat(&self, request: &ChatRequest) -> Result<serde_json::Value> {
        self.chats.lock().await.push(request.clone());
        self.outcome("/chat/message")?;
        Ok(serde_json::json!({"status": "success", "response": "answer"}))
    }
}

/// In-memory store whose delete always fails.
#[derive(Default)]
pub struct FailingDeleteStore {
    inner: Arc<InMemoryArtifactStore>,
}

#[async_trait]
impl ArtifactStore for FailingDeleteStore {
    async fn count_notebooks(&self, owner: &UserId) -> Result<usize> {
        self.inner.count_notebooks(owner).await
    }

    async fn insert_notebook(&self, new: NewNotebook) -> Result<NotebookDetails> {
        self.inner.insert_notebook(new).await
    }

    async fn get_notebook(&self, id: NotebookId, owner: &UserId) -> Result<Option<NotebookDetails>> {
        self.inner.get_notebook(id, owner).await
    }

    async fn list_notebooks(&self, owner: &UserId) -> Result<Vec<NotebookSummary>> {
        self.inner.list_notebooks(owner).await
    }

    async fn delete_notebook(&self, _id: NotebookId, _owner: &UserId) -> Result<bool> {
        Err(DecipherError::persistence("connection reset"))
    }

    async fn replace_sources(
        &self,
        id: NotebookId,
        owner: &UserId,
        sources: Vec<SourceKind>,
        status: StatusRecord,
    ) -> Result<Vec<Source>> {
        self.inner.replace_sources(id, owner, sources, status).await
    }

    async fn set_status(&self, id: NotebookId, owner: &UserId, status: StatusRecord) -> Result<()> {
        self.inner.set_status(id, owner, status).await
    }

    async fn begin_artifact(
        &self,
        id: NotebookId,
        owner: &UserId,
        kind: ArtifactKind,
    ) -> Result<ArtifactClaim> {
        self.inner.begin_artifact(id, owner, kind).await
    }

    async fn write_artifact(
        &self,
        id: NotebookId,
        kind: ArtifactKind,
        state: ArtifactState,
    ) -> Result<()> {
        self.inner.write_artifact(id, kind, state).await
    }

    async fn record_status(&self, id: NotebookId, status: StatusRecord) -> Result<()> {
        self.inner.record_status(id, status).await
    }

    async fn save_output(&self, id: NotebookId, summary: String, faqs: Vec<Faq>) -> Result<()> {
        self.inner.save_output(id, summary, faqs).await
    }
}
