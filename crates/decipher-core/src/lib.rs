//! # Decipher Core
//!
//! Core types for research notebooks and their derived artifacts.
//!
//! This crate provides the shared vocabulary:
//! - [`ProcessingStatus`] - main lifecycle state of a notebook
//! - [`ArtifactState`] - explicit state of a mindmap or audio overview
//! - [`NotebookDraft`] - validated creation input
//! - [`NotebookDetails`] - the JSON shape pollers read
//! - [`DecipherError`] - error taxonomy

pub mod artifact;
pub mod chat;
pub mod error;
pub mod notebook;
pub mod source;
pub mod types;

// Re-exports for convenience
pub use artifact::{ArtifactResolution, ArtifactState, Faq, Output};
pub use chat::{ChatErrorEnvelope, ChatMessage, ChatRequest, ChatRole};
pub use error::{DecipherError, Result};
pub use notebook::{
    default_title, CreateNotebookRequest, Notebook, NotebookDetails, NotebookDraft,
    NotebookDraftBuilder, NotebookSummary, ResearchRequest, StatusRecord, UpdateSourcesRequest,
};
pub use source::{ResearchSource, Source, SourceInput, SourceKind, SourceType, MAX_SOURCES};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::artifact::{ArtifactState, Output};
    pub use crate::error::{DecipherError, Result};
    pub use crate::notebook::{NotebookDetails, NotebookDraft};
    pub use crate::source::{SourceInput, SourceKind};
    pub use crate::types::{ArtifactKind, NotebookId, ProcessingStatus, UserId};
}
