//! Notebook records, the read-endpoint JSON shape, and the creation draft.
//!
//! A [`NotebookDraft`] is the validated form of a creation request. It can only
//! be obtained through [`NotebookDraftBuilder::build`], so anything holding a
//! draft has already passed topic and source validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::Output;
use crate::error::{DecipherError, Result};
use crate::source::{validate_sources, ResearchSource, Source, SourceInput, SourceKind, MAX_SOURCES};
use crate::types::{NotebookId, ProcessingStatus, UserId};

/// Shortest accepted topic, in characters, after trimming.
pub const TOPIC_MIN_CHARS: usize = 3;

/// Longest accepted topic, in characters, after trimming.
pub const TOPIC_MAX_CHARS: usize = 200;

/// Status message written when a notebook is first created.
pub const MSG_CREATED: &str = "Notebook created and queued for processing";

/// Status message written when sources are replaced.
pub const MSG_SOURCES_UPDATED: &str = "Notebook updated and queued for processing";

/// Status message written on a manual retry.
pub const MSG_REQUEUED: &str = "Notebook queued for reprocessing";

/// Title given to a notebook when the user does not pick one.
pub fn default_title(existing: usize) -> String {
    format!("New Notebook {}", existing + 1)
}

/// The top-level unit of research work, owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: NotebookId,
    /// Owner. Always set by the store; the read endpoint may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Main processing status row. Exists for every notebook from creation on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub status: ProcessingStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    pub fn new(status: ProcessingStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn queued(message: impl Into<String>) -> Self {
        Self::new(ProcessingStatus::InQueue, message)
    }
}

/// Full notebook as returned by the read endpoint and consumed by pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookDetails {
    #[serde(flatten)]
    pub notebook: Notebook,
    pub processing_status: Option<StatusRecord>,
    #[serde(default)]
    pub sources: Vec<Source>,
    pub output: Option<Output>,
}

impl NotebookDetails {
    /// Status as the UI sees it; a missing row reads as queued.
    pub fn status(&self) -> ProcessingStatus {
        self.processing_status
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(ProcessingStatus::InQueue)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.processing_status
            .as_ref()
            .and_then(|s| s.message.as_deref())
    }

    pub fn display_title(&self) -> &str {
        self.notebook.title.as_deref().unwrap_or("Untitled")
    }
}

/// Notebook list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookSummary {
    #[serde(flatten)]
    pub notebook: Notebook,
    pub processing_status: Option<StatusRecord>,
}

/// Body of a create-notebook request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNotebookRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceInput>,
}

/// Body of a replace-sources request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSourcesRequest {
    pub sources: Vec<SourceInput>,
}

/// Payload sent to the research trigger endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: Option<String>,
    pub sources: Vec<ResearchSource>,
    pub notebook_id: NotebookId,
}

impl ResearchRequest {
    pub fn new(notebook_id: NotebookId, topic: Option<String>, sources: &[SourceKind]) -> Self {
        Self {
            topic,
            sources: sources.iter().map(SourceKind::to_research).collect(),
            notebook_id,
        }
    }
}

/// Validated input for notebook creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookDraft {
    topic: Option<String>,
    sources: Vec<SourceKind>,
}

impl NotebookDraft {
    /// Create a new NotebookDraftBuilder.
    pub fn builder() -> NotebookDraftBuilder {
        NotebookDraftBuilder::new()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn sources(&self) -> &[SourceKind] {
        &self.sources
    }

    /// Whether the research pipeline has anything to work on.
    pub fn needs_research(&self) -> bool {
        self.topic.is_some() || !self.sources.is_empty()
    }

    pub fn into_parts(self) -> (Option<String>, Vec<SourceKind>) {
        (self.topic, self.sources)
    }
}

/// Builder for [`NotebookDraft`].
#[derive(Debug)]
pub struct NotebookDraftBuilder {
    topic: Option<String>,
    sources: Vec<SourceInput>,
    max_sources: usize,
}

impl Default for NotebookDraftBuilder {
    fn default() -> Self {
        Self {
            topic: None,
            sources: Vec::new(),
            max_sources: MAX_SOURCES,
        }
    }
}

impl NotebookDraftBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn maybe_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    pub fn source(mut self, source: SourceInput) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = SourceInput>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Validate and build the draft.
    pub fn build(self) -> Result<NotebookDraft> {
        let topic = match self.topic.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(topic) => {
                let chars = topic.chars().count();
                if chars < TOPIC_MIN_CHARS {
                    return Err(DecipherError::validation(format!(
                        "Topic must be at least {TOPIC_MIN_CHARS} characters"
                    )));
                }
                if chars > TOPIC_MAX_CHARS {
                    return Err(DecipherError::validation(format!(
                        "Topic must be at most {TOPIC_MAX_CHARS} characters"
                    )));
                }
                Some(topic.to_string())
            }
        };

        let sources = validate_sources(self.sources, self.max_sources)?;

        if topic.is_none() && sources.is_empty() {
            return Err(DecipherError::validation(
                "Either a topic or at least one source is required",
            ));
        }

        Ok(NotebookDraft { topic, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_with_topic_only() {
        let draft = NotebookDraft::builder()
            .topic("  Quantum Computing Basics ")
            .build()
            .unwrap();
        assert_eq!(draft.topic(), Some("Quantum Computing Basics"));
        assert!(draft.sources().is_empty());
        assert!(draft.needs_research());
    }

    #[test]
    fn test_draft_rejects_short_topic() {
        let err = NotebookDraft::builder().topic("ai").build().unwrap_err();
        assert!(matches!(err, DecipherError::Validation { .. }));
    }

    #[test]
    fn test_draft_rejects_long_topic() {
        let topic = "x".repeat(TOPIC_MAX_CHARS + 1);
        assert!(NotebookDraft::builder().topic(topic).build().is_err());
        let topic = "x".repeat(TOPIC_MAX_CHARS);
        assert!(NotebookDraft::builder().topic(topic).build().is_ok());
    }

    #[test]
    fn test_draft_requires_topic_or_source() {
        assert!(NotebookDraft::builder().build().is_err());
        assert!(NotebookDraft::builder().topic("   ").build().is_err());

        let draft = NotebookDraft::builder()
            .topic("   ")
            .source(SourceInput::url("https://example.com"))
            .build()
            .unwrap();
        assert!(draft.topic().is_none());
        assert_eq!(draft.sources().len(), 1);
    }

    #[test]
    fn test_draft_source_cap() {
        let result = NotebookDraft::builder()
            .max_sources(1)
            .source(SourceInput::manual("a"))
            .source(SourceInput::manual("b"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title(0), "New Notebook 1");
        assert_eq!(default_title(4), "New Notebook 5");
    }

    #[test]
    fn test_details_json_shape() {
        let details = NotebookDetails {
            notebook: Notebook {
                id: uuid::Uuid::new_v4(),
                user_id: Some(UserId::new("u1")),
                title: Some("New Notebook 1".to_string()),
                topic: Some("Quantum Computing Basics".to_string()),
                created_at: Utc::now(),
                updated_at: None,
            },
            processing_status: Some(StatusRecord::queued(MSG_CREATED)),
            sources: vec![],
            output: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["processingStatus"]["status"], "IN_QUEUE");
        assert!(json["output"].is_null());
        assert_eq!(json["title"], "New Notebook 1");
        assert!(json.get("createdAt").is_some());

        let back: NotebookDetails = serde_json::from_value(json).unwrap();
        assert_eq!(back.status(), ProcessingStatus::InQueue);
    }

    #[test]
    fn test_details_parse_without_owner_or_source_timestamps() {
        let json = serde_json::json!({
            "id": "6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f",
            "title": "Quantum Computing Basics",
            "topic": "Quantum Computing Basics",
            "createdAt": "2026-10-19T08:00:00Z",
            "updatedAt": null,
            "processingStatus": { "status": "PROCESSED", "message": "Done" },
            "sources": [
                {
                    "id": "0b6a2f9e-1c4d-4e8a-b7f3-5d2c9a8e1f40",
                    "sourceType": "URL",
                    "sourceUrl": "https://example.com/qubits",
                    "content": null,
                    "filePath": null,
                    "filename": null
                },
                {
                    "id": "3e9d7c1a-2b4f-4a6e-8c5d-7f1e0b9a2c36",
                    "sourceType": "UPLOAD",
                    "sourceUrl": "https://files.example.com/uploads/alice/1-abc123-notes.pdf",
                    "content": null,
                    "filePath": "uploads/alice/1-abc123-notes.pdf",
                    "filename": "notes.pdf"
                }
            ],
            "output": {
                "summary": "Qubits and gates",
                "mindmap": "IN_PROGRESS",
                "audioOverviewUrl": null,
                "faqs": []
            }
        });

        let details: NotebookDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.notebook.user_id, None);
        assert_eq!(details.status(), ProcessingStatus::Processed);
        assert_eq!(details.sources.len(), 2);
        assert!(details.sources.iter().all(|s| s.created_at.is_none()));
        let output = details.output.unwrap();
        assert!(output.mindmap.is_in_progress());
        assert_eq!(output.audio_overview_url, crate::ArtifactState::Absent);
    }

    #[test]
    fn test_research_request_shape() {
        let id = uuid::Uuid::new_v4();
        let sources = vec![SourceKind::Manual {
            content: "text".to_string(),
        }];
        let req = ResearchRequest::new(id, None, &sources);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json["topic"].is_null());
        assert_eq!(json["sources"][0]["source_type"], "MANUAL");
        assert_eq!(json["sources"][0]["source_content"], "text");
        assert!(json["sources"][0]["source_url"].is_null());
        assert_eq!(json["notebook_id"], id.to_string());
    }
}
