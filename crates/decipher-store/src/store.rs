//! Artifact store implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use decipher_core::{
    ArtifactKind, ArtifactState, DecipherError, Faq, Notebook, NotebookDetails, NotebookId,
    NotebookSummary, Output, ProcessingStatus, Result, Source, SourceKind, StatusRecord, UserId,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Everything inserted by the creation transaction.
#[derive(Debug, Clone)]
pub struct NewNotebook {
    pub owner: UserId,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub sources: Vec<SourceKind>,
    pub status: StatusRecord,
}

/// Outcome of trying to move an artifact into `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactClaim {
    /// The field now reads `InProgress`; the caller must trigger generation.
    Started,
    /// Someone already claimed it; no remote call should be made.
    AlreadyInProgress,
}

/// Trait for the durable record of notebooks.
///
/// Methods taking an owner filter on it and report a notebook owned by
/// someone else exactly like a missing one. Methods without an owner are the
/// write-back path used once ownership was checked or by the research worker.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Number of notebooks the user owns.
    async fn count_notebooks(&self, owner: &UserId) -> Result<usize>;

    /// Insert notebook, sources and status in one transaction.
    async fn insert_notebook(&self, new: NewNotebook) -> Result<NotebookDetails>;

    /// Read a notebook with all its relations.
    async fn get_notebook(&self, id: NotebookId, owner: &UserId) -> Result<Option<NotebookDetails>>;

    /// List the user's notebooks, newest first.
    async fn list_notebooks(&self, owner: &UserId) -> Result<Vec<NotebookSummary>>;

    /// Delete a notebook and everything it owns. Returns false if nothing matched.
    async fn delete_notebook(&self, id: NotebookId, owner: &UserId) -> Result<bool>;

    /// Delete all sources, insert the replacements, reset the status and
    /// bump `updated_at`, atomically.
    async fn replace_sources(
        &self,
        id: NotebookId,
        owner: &UserId,
        sources: Vec<SourceKind>,
        status: StatusRecord,
    ) -> Result<Vec<Source>>;

    /// Overwrite the processing status of an owned notebook.
    async fn set_status(&self, id: NotebookId, owner: &UserId, status: StatusRecord) -> Result<()>;

    /// Conditionally move an artifact to `InProgress`.
    ///
    /// Fails with `Precondition` unless the notebook is `PROCESSED` and has
    /// an output row.
    async fn begin_artifact(
        &self,
        id: NotebookId,
        owner: &UserId,
        kind: ArtifactKind,
    ) -> Result<ArtifactClaim>;

    /// Write an artifact state unconditionally.
    async fn write_artifact(&self, id: NotebookId, kind: ArtifactKind, state: ArtifactState)
        -> Result<()>;

    /// Worker write-back of the processing status.
    async fn record_status(&self, id: NotebookId, status: StatusRecord) -> Result<()>;

    /// Worker write-back of summary and FAQs. Artifact fields are preserved.
    async fn save_output(&self, id: NotebookId, summary: String, faqs: Vec<Faq>) -> Result<()>;
}

#[derive(Debug, Clone)]
struct NotebookRow {
    notebook: Notebook,
    status: StatusRecord,
    sources: Vec<Source>,
    output: Option<Output>,
}

impl NotebookRow {
    fn details(&self) -> NotebookDetails {
        NotebookDetails {
            notebook: self.notebook.clone(),
            processing_status: Some(self.status.clone()),
            sources: self.sources.clone(),
            output: self.output.clone(),
        }
    }

    fn touch(&mut self) {
        self.notebook.updated_at = Some(Utc::now());
    }
}

/// In-memory implementation of ArtifactStore.
///
/// All rows live under one lock, so every multi-row operation is atomic and
/// every read sees all earlier writes.
pub struct InMemoryArtifactStore {
    notebooks: Arc<RwLock<HashMap<NotebookId, NotebookRow>>>,
}

impl InMemoryArtifactStore {
    /// Create a new in-memory artifact store.
    pub fn new() -> Self {
        Self {
            notebooks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Total notebooks across all users.
    pub async fn len(&self) -> usize {
        self.notebooks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notebooks.read().await.is_empty()
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

fn owned_mut<'a>(
    rows: &'a mut HashMap<NotebookId, NotebookRow>,
    id: NotebookId,
    owner: &UserId,
) -> Result<&'a mut NotebookRow> {
    rows.get_mut(&id)
        .filter(|row| row.notebook.user_id.as_ref() == Some(owner))
        .ok_or_else(|| DecipherError::notebook_not_found(id))
}

fn any_mut(rows: &mut HashMap<NotebookId, NotebookRow>, id: NotebookId) -> Result<&mut NotebookRow> {
    rows.get_mut(&id)
        .ok_or_else(|| DecipherError::notebook_not_found(id))
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn count_notebooks(&self, owner: &UserId) -> Result<usize> {
        let rows = self.notebooks.read().await;
        Ok(rows.values().filter(|r| r.notebook.user_id.as_ref() == Some(owner)).count())
    }

    async fn insert_notebook(&self, new: NewNotebook) -> Result<NotebookDetails> {
        let now = Utc::now();
        let row = NotebookRow {
            notebook: Notebook {
                id: Uuid::new_v4(),
                user_id: Some(new.owner),
                title: new.title,
                topic: new.topic,
                created_at: now,
                updated_at: Some(now),
            },
            status: new.status,
            sources: new.sources.into_iter().map(Source::new).collect(),
            output: None,
        };
        let details = row.details();

        let mut rows = self.notebooks.write().await;
        rows.insert(row.notebook.id, row);
        debug!(notebook_id = %details.notebook.id, "inserted notebook");

        Ok(details)
    }

    async fn get_notebook(&self, id: NotebookId, owner: &UserId) -> Result<Option<NotebookDetails>> {
        let rows = self.notebooks.read().await;
        Ok(rows
            .get(&id)
            .filter(|row| row.notebook.user_id.as_ref() == Some(owner))
            .map(NotebookRow::details))
    }

    async fn list_notebooks(&self, owner: &UserId) -> Result<Vec<NotebookSummary>> {
        let rows = self.notebooks.read().await;
        let mut summaries: Vec<NotebookSummary> = rows
            .values()
            .filter(|row| row.notebook.user_id.as_ref() == Some(owner))
            .map(|row| NotebookSummary {
                notebook: row.notebook.clone(),
                processing_status: Some(row.status.clone()),
            })
            .collect();
        summaries.sort_by(|a, b| b.notebook.created_at.cmp(&a.notebook.created_at));
        Ok(summaries)
    }

    async fn delete_notebook(&self, id: NotebookId, owner: &UserId) -> Result<bool> {
        let mut rows = self.notebooks.write().await;
        let owned = rows
            .get(&id)
            .is_some_and(|row| row.notebook.user_id.as_ref() == Some(owner));
        if owned {
            rows.remove(&id);
            debug!(notebook_id = %id, "deleted notebook with its sources, status and output");
        }
        Ok(owned)
    }

    async fn replace_sources(
        &self,
        id: NotebookId,
        owner: &UserId,
        sources: Vec<SourceKind>,
        status: StatusRecord,
    ) -> Result<Vec<Source>> {
        let mut rows = self.notebooks.write().await;
        let row = owned_mut(&mut rows, id, owner)?;

        row.sources = sources.into_iter().map(Source::new).collect();
        row.status = status;
        row.touch();

        Ok(row.sources.clone())
    }

    async fn set_status(&self, id: NotebookId, owner: &UserId, status: StatusRecord) -> Result<()> {
        let mut rows = self.notebooks.write().await;
        let row = owned_mut(&mut rows, id, owner)?;
        row.status = status;
        row.touch();
        Ok(())
    }

    async fn begin_artifact(
        &self,
        id: NotebookId,
        owner: &UserId,
        kind: ArtifactKind,
    ) -> Result<ArtifactClaim> {
        let mut rows = self.notebooks.write().await;
        let row = owned_mut(&mut rows, id, owner)?;

        if row.status.status != ProcessingStatus::Processed {
            return Err(DecipherError::precondition(format!(
                "Notebook must be processed before generating {} (status is {})",
                kind.display_name().to_lowercase(),
                row.status.status
            )));
        }
        let output = row.output.as_mut().ok_or_else(|| {
            DecipherError::precondition(format!(
                "Notebook must be processed before generating {}",
                kind.display_name().to_lowercase()
            ))
        })?;

        let slot = output.artifact_mut(kind);
        if slot.is_in_progress() {
            return Ok(ArtifactClaim::AlreadyInProgress);
        }
        *slot = ArtifactState::InProgress;
        Ok(ArtifactClaim::Started)
    }

    async fn write_artifact(
        &self,
        id: NotebookId,
        kind: ArtifactKind,
        state: ArtifactState,
    ) -> Result<()> {
        let mut rows = self.notebooks.write().await;
        let row = any_mut(&mut rows, id)?;
        let output = row.output.as_mut().ok_or_else(|| {
            DecipherError::precondition(format!("Notebook {id} has no output to attach {kind} to"))
        })?;
        *output.artifact_mut(kind) = state;
        Ok(())
    }

    async fn record_status(&self, id: NotebookId, status: StatusRecord) -> Result<()> {
        let mut rows = self.notebooks.write().await;
        let row = any_mut(&mut rows, id)?;
        row.status = status;
        row.touch();
        Ok(())
    }

    async fn save_output(&self, id: NotebookId, summary: String, faqs: Vec<Faq>) -> Result<()> {
        let mut rows = self.notebooks.write().await;
        let row = any_mut(&mut rows, id)?;
        match row.output.as_mut() {
            Some(output) => {
                output.summary = Some(summary);
                output.faqs = faqs;
            }
            None => row.output = Some(Output::new(summary, faqs)),
        }
        row.touch();
        Ok(())
    }
}
