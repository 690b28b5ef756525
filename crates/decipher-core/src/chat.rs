//! Chat request/response plumbing.
//!
//! Chat is stateless: the client keeps the history and resends all of it on
//! every call.

use serde::{Deserialize, Serialize};

use crate::types::NotebookId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of a chat call, both from the browser and to the chat service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub notebook_id: NotebookId,
}

/// Error envelope returned in place of a chat answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatErrorEnvelope {
    pub status: String,
    pub response: String,
}

impl ChatErrorEnvelope {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            response: response.into(),
        }
    }
}
