//! Common types shared by the store, the lifecycle controller and the pollers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a notebook.
pub type NotebookId = uuid::Uuid;

/// Identity of an authenticated user, as issued by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Main processing status of a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// Waiting for the research pipeline to pick it up.
    InQueue,
    /// The research pipeline is working on it.
    InProgress,
    /// Summary and FAQs are available.
    Processed,
    /// The research pipeline gave up.
    Error,
}

impl ProcessingStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Processed | ProcessingStatus::Error)
    }

    /// Returns true if the pipeline still owes us a result.
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessingStatus::InQueue | ProcessingStatus::InProgress)
    }

    /// Human-readable badge label.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStatus::InQueue => "In Queue",
            ProcessingStatus::InProgress => "Processing",
            ProcessingStatus::Processed => "Processed",
            ProcessingStatus::Error => "Error",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::InQueue => "IN_QUEUE",
            ProcessingStatus::InProgress => "IN_PROGRESS",
            ProcessingStatus::Processed => "PROCESSED",
            ProcessingStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived artifact that is generated on demand after main processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Mindmap,
    AudioOverview,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Mindmap, ArtifactKind::AudioOverview];

    /// Path segment used both by the node API and the generation service.
    pub fn route_segment(&self) -> &'static str {
        match self {
            ArtifactKind::Mindmap => "mindmap",
            ArtifactKind::AudioOverview => "audio-overview",
        }
    }

    /// Name of the output field that carries this artifact.
    pub fn field_name(&self) -> &'static str {
        match self {
            ArtifactKind::Mindmap => "mindmap",
            ArtifactKind::AudioOverview => "audioOverviewUrl",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ArtifactKind::Mindmap => "Mindmap",
            ArtifactKind::AudioOverview => "Audio overview",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_segment())
    }
}
