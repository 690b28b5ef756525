//! Derived artifact state and the notebook output that carries it.
//!
//! Mindmap and audio overview share one state machine:
//!
//! ```text
//! Absent ──generate──▶ InProgress ──worker──▶ Ready(payload)
//!                         │   ▲                    │
//!                         ▼   └──────generate──────┤
//!                       Failed ◀──worker───────────┘
//! ```
//!
//! On the wire the state travels in a single nullable string: `null`,
//! `"IN_PROGRESS"`, `"ERROR"`, or the payload itself. [`ArtifactState`] keeps
//! the discriminant explicit and refuses payloads that collide with the
//! sentinels, so a decoded value is never ambiguous.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DecipherError, Result};

/// Wire sentinel for an artifact that is being generated.
pub const IN_PROGRESS_SENTINEL: &str = "IN_PROGRESS";

/// Wire sentinel for an artifact whose generation failed.
pub const ERROR_SENTINEL: &str = "ERROR";

/// State of a derived artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArtifactState {
    /// Never requested.
    #[default]
    Absent,
    /// Generation was triggered and has not resolved yet.
    InProgress,
    /// Generation finished; holds the payload (JSON tree or audio URL).
    Ready(String),
    /// Generation failed.
    Failed,
}

impl ArtifactState {
    /// Build a `Ready` state, rejecting blank payloads and sentinel strings.
    pub fn ready(payload: impl Into<String>) -> Result<Self> {
        let payload = payload.into();
        if payload.trim().is_empty() {
            return Err(DecipherError::validation("artifact payload cannot be empty"));
        }
        if payload == IN_PROGRESS_SENTINEL || payload == ERROR_SENTINEL {
            return Err(DecipherError::validation(format!(
                "artifact payload cannot be the reserved value {payload:?}"
            )));
        }
        Ok(ArtifactState::Ready(payload))
    }

    /// Decode the single-column wire representation.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            None => ArtifactState::Absent,
            Some(IN_PROGRESS_SENTINEL) => ArtifactState::InProgress,
            Some(ERROR_SENTINEL) => ArtifactState::Failed,
            Some(payload) if payload.is_empty() => ArtifactState::Absent,
            Some(payload) => ArtifactState::Ready(payload.to_string()),
        }
    }

    /// Encode into the single-column wire representation.
    pub fn to_wire(&self) -> Option<&str> {
        match self {
            ArtifactState::Absent => None,
            ArtifactState::InProgress => Some(IN_PROGRESS_SENTINEL),
            ArtifactState::Failed => Some(ERROR_SENTINEL),
            ArtifactState::Ready(payload) => Some(payload.as_str()),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, ArtifactState::InProgress)
    }

    /// Ready or Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArtifactState::Ready(_) | ArtifactState::Failed)
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            ArtifactState::Ready(payload) => Some(payload),
            _ => None,
        }
    }
}

impl Serialize for ArtifactState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ArtifactState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(ArtifactState::from_wire(raw.as_deref()))
    }
}

/// Terminal result reported by the generation worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactResolution {
    Ready { payload: String },
    Error,
}

impl ArtifactResolution {
    /// Convert into a stored state, validating the payload.
    pub fn into_state(self) -> Result<ArtifactState> {
        match self {
            ArtifactResolution::Ready { payload } => ArtifactState::ready(payload),
            ArtifactResolution::Error => Ok(ArtifactState::Failed),
        }
    }
}

/// A question/answer pair produced alongside the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Output of main processing plus the derived artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub mindmap: ArtifactState,
    #[serde(default)]
    pub audio_overview_url: ArtifactState,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

impl Output {
    pub fn new(summary: impl Into<String>, faqs: Vec<Faq>) -> Self {
        Self {
            summary: Some(summary.into()),
            faqs,
            ..Default::default()
        }
    }

    pub fn artifact(&self, kind: crate::ArtifactKind) -> &ArtifactState {
        match kind {
            crate::ArtifactKind::Mindmap => &self.mindmap,
            crate::ArtifactKind::AudioOverview => &self.audio_overview_url,
        }
    }

    pub fn artifact_mut(&mut self, kind: crate::ArtifactKind) -> &mut ArtifactState {
        match kind {
            crate::ArtifactKind::Mindmap => &mut self.mindmap,
            crate::ArtifactKind::AudioOverview => &mut self.audio_overview_url,
        }
    }

    /// Parse the mindmap payload as a JSON tree, if it is ready.
    pub fn mindmap_tree(&self) -> Option<Result<serde_json::Value>> {
        self.mindmap
            .payload()
            .map(|raw| serde_json::from_str(raw).map_err(DecipherError::from))
    }
}
