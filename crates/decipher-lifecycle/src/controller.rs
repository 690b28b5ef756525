//! Lifecycle controller.
//!
//! Orchestrates every user-initiated change to a notebook: creation through
//! the [`CreationSaga`], retry, source replacement, derived-artifact
//! generation and chat. Ownership and validation are checked before any
//! remote call.

use std::sync::Arc;

use chrono::Utc;
use decipher_core::notebook::{MSG_REQUEUED, MSG_SOURCES_UPDATED};
use decipher_core::source::validate_sources;
use decipher_core::{
    ArtifactKind, ArtifactResolution, ArtifactState, ChatRequest, CreateNotebookRequest,
    DecipherError, Faq, NotebookDetails, NotebookDraft, NotebookId, NotebookSummary,
    ProcessingStatus, ResearchRequest, Result, Source, SourceInput, StatusRecord, UserId,
    MAX_SOURCES,
};
use decipher_store::{ArtifactClaim, ArtifactStore};
use tracing::{error, info, warn};

use crate::saga::CreationSaga;
use crate::trigger::GenerationService;

/// Result of asking for a derived artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStart {
    /// The field was set to `IN_PROGRESS` and the service acknowledged the job.
    Started,
    /// A generation was already running; nothing was sent.
    AlreadyInProgress,
}

/// The notebook lifecycle controller.
#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn ArtifactStore>,
    generator: Arc<dyn GenerationService>,
    saga: CreationSaga,
    max_sources: usize,
}

impl LifecycleController {
    /// Create a new controller.
    pub fn new(store: Arc<dyn ArtifactStore>, generator: Arc<dyn GenerationService>) -> Self {
        let saga = CreationSaga::new(store.clone(), generator.clone());
        Self {
            store,
            generator,
            saga,
            max_sources: MAX_SOURCES,
        }
    }

    /// Override the per-notebook source cap.
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    async fn owned(&self, id: NotebookId, owner: &UserId) -> Result<NotebookDetails> {
        self.store
            .get_notebook(id, owner)
            .await?
            .ok_or_else(|| DecipherError::notebook_not_found(id))
    }

    /// Create a notebook and queue its research, all or nothing.
    pub async fn create_notebook(
        &self,
        owner: &UserId,
        request: CreateNotebookRequest,
    ) -> Result<NotebookDetails> {
        let draft = NotebookDraft::builder()
            .maybe_topic(request.topic)
            .sources(request.sources)
            .max_sources(self.max_sources)
            .build()?;

        self.saga.run(owner, draft).await?.into_result()
    }

    /// Read one notebook.
    pub async fn get_notebook(&self, id: NotebookId, owner: &UserId) -> Result<NotebookDetails> {
        self.owned(id, owner).await
    }

    /// List the user's notebooks, newest first.
    pub async fn list_notebooks(&self, owner: &UserId) -> Result<Vec<NotebookSummary>> {
        self.store.list_notebooks(owner).await
    }

    /// Delete a notebook with everything it owns.
    pub async fn delete_notebook(&self, id: NotebookId, owner: &UserId) -> Result<()> {
        if self.store.delete_notebook(id, owner).await? {
            info!(notebook_id = %id, "notebook deleted by owner");
            Ok(())
        } else {
            Err(DecipherError::notebook_not_found(id))
        }
    }

    /// Re-queue main processing and resend all current sources.
    ///
    /// On upstream failure the status stays `IN_QUEUE`; nothing is rolled back.
    pub async fn retry_notebook(&self, id: NotebookId, owner: &UserId) -> Result<()> {
        let details = self.owned(id, owner).await?;

        self.store
            .set_status(id, owner, StatusRecord::queued(MSG_REQUEUED))
            .await?;

        let sources: Vec<_> = details.sources.iter().map(|s| s.kind.clone()).collect();
        let topic = details.notebook.topic.clone();
        if topic.is_none() && sources.is_empty() {
            warn!(notebook_id = %id, "notebook has neither topic nor sources, not triggering");
            return Ok(());
        }

        let request = ResearchRequest::new(id, topic, &sources);
        if let Err(err) = self.generator.start_research(&request).await {
            warn!(notebook_id = %id, error = %err, "retry trigger failed, notebook left in queue");
            return Err(err);
        }

        info!(notebook_id = %id, sources = sources.len(), "notebook re-queued");
        Ok(())
    }

    /// Replace all sources and reset status to `IN_QUEUE`.
    ///
    /// Does not trigger research; a retry is expected to follow.
    pub async fn update_sources(
        &self,
        id: NotebookId,
        owner: &UserId,
        sources: Vec<SourceInput>,
    ) -> Result<Vec<Source>> {
        let details = self.owned(id, owner).await?;
        let sources = validate_sources(sources, self.max_sources)?;
        if sources.is_empty() && details.notebook.topic.is_none() {
            return Err(DecipherError::validation(
                "A notebook without a topic needs at least one source",
            ));
        }

        let stored = self
            .store
            .replace_sources(id, owner, sources, StatusRecord::queued(MSG_SOURCES_UPDATED))
            .await?;
        info!(notebook_id = %id, sources = stored.len(), "sources replaced");
        Ok(stored)
    }

    /// Start generating a mindmap or audio overview.
    ///
    /// The field reads `IN_PROGRESS` before the remote call is made. If the
    /// call is not acknowledged the field is rolled forward to `ERROR`.
    pub async fn generate_artifact(
        &self,
        id: NotebookId,
        owner: &UserId,
        kind: ArtifactKind,
    ) -> Result<GenerationStart> {
        match self.store.begin_artifact(id, owner, kind).await? {
            ArtifactClaim::AlreadyInProgress => {
                info!(notebook_id = %id, artifact = %kind, "generation already in progress");
                return Ok(GenerationStart::AlreadyInProgress);
            }
            ArtifactClaim::Started => {}
        }

        match self.generator.start_artifact(id, kind).await {
            Ok(()) => {
                info!(notebook_id = %id, artifact = %kind, "generation started");
                Ok(GenerationStart::Started)
            }
            Err(err) => {
                warn!(notebook_id = %id, artifact = %kind, error = %err, "generation trigger failed");
                if let Err(write_err) = self
                    .store
                    .write_artifact(id, kind, ArtifactState::Failed)
                    .await
                {
                    error!(
                        notebook_id = %id,
                        artifact = %kind,
                        error = %write_err,
                        "could not mark artifact as failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Forward a chat turn to the chat service.
    pub async fn chat(&self, owner: &UserId, request: ChatRequest) -> Result<serde_json::Value> {
        if request.messages.is_empty() {
            return Err(DecipherError::validation("messages cannot be empty"));
        }
        self.owned(request.notebook_id, owner).await?;
        self.generator.chat(&request).await
    }

    /// Worker write-back: main processing status.
    pub async fn report_status(
        &self,
        id: NotebookId,
        status: ProcessingStatus,
        message: Option<String>,
    ) -> Result<()> {
        let record = StatusRecord {
            status,
            message,
            updated_at: Some(Utc::now()),
        };
        self.store.record_status(id, record).await?;
        info!(notebook_id = %id, status = %status, "worker reported status");
        Ok(())
    }

    /// Worker write-back: summary and FAQs.
    pub async fn report_output(&self, id: NotebookId, summary: String, faqs: Vec<Faq>) -> Result<()> {
        self.store.save_output(id, summary, faqs).await?;
        info!(notebook_id = %id, "worker saved output");
        Ok(())
    }

    /// Worker write-back: terminal state of a derived artifact.
    pub async fn report_artifact(
        &self,
        id: NotebookId,
        kind: ArtifactKind,
        resolution: ArtifactResolution,
    ) -> Result<()> {
        let state = resolution.into_state()?;
        self.store.write_artifact(id, kind, state).await?;
        info!(notebook_id = %id, artifact = %kind, "worker resolved artifact");
        Ok(())
    }
}
