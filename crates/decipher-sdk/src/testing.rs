//! Scripted node API for poller and monitor tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use decipher_core::{
    ArtifactKind, ArtifactState, DecipherError, Notebook, NotebookDetails, NotebookId, Output,
    ProcessingStatus, Result, StatusRecord, UserId,
};
use uuid::Uuid;

use crate::client::{GenerationAccepted, NotebookApi};

pub fn details(status: ProcessingStatus) -> NotebookDetails {
    NotebookDetails {
        notebook: Notebook {
            id: Uuid::nil(),
            user_id: Some(UserId::new("alice")),
            title: Some("Quantum Computing Basics".to_string()),
            topic: Some("Quantum Computing Basics".to_string()),
            created_at: chrono::Utc::now(),
            updated_at: None,
        },
        processing_status: Some(StatusRecord {
            status,
            message: None,
            updated_at: None,
        }),
        sources: vec![],
        output: (status == ProcessingStatus::Processed)
            .then(|| Output::new("Qubits and gates", vec![])),
    }
}

pub fn with_artifact(
    mut details: NotebookDetails,
    kind: ArtifactKind,
    state: ArtifactState,
) -> NotebookDetails {
    if let Some(output) = details.output.as_mut() {
        *output.artifact_mut(kind) = state;
    }
    details
}

/// Answers fetches from a script, repeating the last entry once it runs out.
pub struct ScriptedApi {
    notebook_id: NotebookId,
    script: Mutex<VecDeque<Result<NotebookDetails>>>,
    latency: Option<Duration>,
    fail_generate: bool,
    fetches: AtomicUsize,
    generates: Mutex<Vec<ArtifactKind>>,
    retries: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(script: Vec<Result<NotebookDetails>>) -> Self {
        Self {
            notebook_id: Uuid::new_v4(),
            script: Mutex::new(script.into()),
            latency: None,
            fail_generate: false,
            fetches: AtomicUsize::new(0),
            generates: Mutex::new(Vec::new()),
            retries: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn failing_generate(mut self) -> Self {
        self.fail_generate = true;
        self
    }

    pub fn notebook_id(&self) -> NotebookId {
        self.notebook_id
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn generates(&self) -> Vec<ArtifactKind> {
        self.generates.lock().unwrap().clone()
    }

    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::SeqCst)
    }

    /// Replace the remaining script.
    pub fn set_script(&self, script: Vec<Result<NotebookDetails>>) {
        *self.script.lock().unwrap() = script.into();
    }

    fn next(&self) -> Result<NotebookDetails> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(DecipherError::notebook_not_found(self.notebook_id)))
        }
    }
}

#[async_trait]
impl NotebookApi for ScriptedApi {
    async fn fetch_notebook(&self, _id: NotebookId) -> Result<NotebookDetails> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.next()
    }

    async fn generate_artifact(&self, _id: NotebookId, kind: ArtifactKind) -> Result<GenerationAccepted> {
        self.generates.lock().unwrap().push(kind);
        if self.fail_generate {
            return Err(DecipherError::Upstream {
                endpoint: format!("/api/notebooks/{}/{}", self.notebook_id, kind.route_segment()),
                status: Some(502),
                message: "503 - worker down".to_string(),
            });
        }
        Ok(GenerationAccepted {
            artifact: kind,
            state: "IN_PROGRESS".to_string(),
            already_in_progress: false,
        })
    }

    async fn retry_notebook(&self, _id: NotebookId) -> Result<()> {
        self.retries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
