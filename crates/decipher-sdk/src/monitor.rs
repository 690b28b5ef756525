//! Per-view notebook monitor.
//!
//! A [`NotebookMonitor`] is what a notebook detail view holds while it is
//! mounted. It owns up to three poll loops (main status plus one per derived
//! artifact) under a single parent [`CancellationToken`], so tearing the view
//! down stops all of them.

use std::collections::HashMap;
use std::sync::Arc;

use decipher_core::{
    ArtifactKind, ArtifactState, NotebookDetails, NotebookId, ProcessingStatus, Result,
};
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::NotebookApi;
use crate::poller::{ArtifactPoller, Notification, PollConfig, PollHandle, StatusPoller};

const NOTIFICATION_BUFFER: usize = 16;

/// Result of [`NotebookMonitor::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The node accepted the request and a poller is watching the artifact.
    Started,
    /// A poller was already watching this artifact; no request was sent.
    Suppressed,
}

/// Owns the poll loops of one mounted notebook view.
pub struct NotebookMonitor {
    api: Arc<dyn NotebookApi>,
    notebook_id: NotebookId,
    config: PollConfig,
    token: CancellationToken,
    notifications: mpsc::Sender<Notification>,
    snapshot: NotebookDetails,
    status: Option<PollHandle>,
    artifacts: HashMap<ArtifactKind, PollHandle>,
}

impl NotebookMonitor {
    /// Fetch the notebook and start whichever pollers its state calls for.
    pub async fn mount(
        api: Arc<dyn NotebookApi>,
        notebook_id: NotebookId,
        config: PollConfig,
    ) -> Result<(Self, ReceiverStream<Notification>)> {
        let snapshot = api.fetch_notebook(notebook_id).await?;
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);

        let mut monitor = Self {
            api,
            notebook_id,
            config,
            token: CancellationToken::new(),
            notifications: tx,
            snapshot,
            status: None,
            artifacts: HashMap::new(),
        };

        let initial_status = monitor.snapshot.status();
        if initial_status.is_active() {
            monitor.start_status_poller(initial_status);
        }
        for kind in ArtifactKind::ALL {
            let state = monitor
                .snapshot
                .output
                .as_ref()
                .map(|output| output.artifact(kind).clone())
                .unwrap_or_default();
            if state.is_in_progress() {
                monitor.start_artifact_poller(kind);
            }
        }

        info!(
            notebook_id = %notebook_id,
            status = %initial_status,
            artifacts = monitor.artifacts.len(),
            "notebook view mounted"
        );
        Ok((monitor, ReceiverStream::new(rx)))
    }

    pub fn notebook_id(&self) -> NotebookId {
        self.notebook_id
    }

    /// The notebook as it was when the view mounted.
    pub fn snapshot(&self) -> &NotebookDetails {
        &self.snapshot
    }

    pub fn is_polling_status(&self) -> bool {
        self.status.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_polling_artifact(&self, kind: ArtifactKind) -> bool {
        self.artifacts
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    fn start_status_poller(&mut self, initial: ProcessingStatus) {
        let poller = StatusPoller::new(
            self.api.clone(),
            self.notebook_id,
            self.config.status_interval,
            self.notifications.clone(),
        );
        self.status = Some(poller.spawn(initial, self.token.child_token()));
    }

    fn start_artifact_poller(&mut self, kind: ArtifactKind) {
        let poller = ArtifactPoller::new(
            self.api.clone(),
            self.notebook_id,
            kind,
            self.config.artifact_interval,
            self.notifications.clone(),
        );
        let handle = poller.spawn(ArtifactState::InProgress, self.token.child_token());
        self.artifacts.insert(kind, handle);
    }

    /// Request a derived artifact.
    ///
    /// While this view already watches the artifact in progress the call is
    /// suppressed locally and nothing is sent.
    pub async fn generate(&mut self, kind: ArtifactKind) -> Result<GenerateOutcome> {
        if self.is_polling_artifact(kind) {
            debug!(notebook_id = %self.notebook_id, artifact = %kind, "generation already being watched");
            return Ok(GenerateOutcome::Suppressed);
        }

        self.api.generate_artifact(self.notebook_id, kind).await?;
        self.start_artifact_poller(kind);
        info!(notebook_id = %self.notebook_id, artifact = %kind, "generation requested");
        Ok(GenerateOutcome::Started)
    }

    /// Re-queue main processing and watch it again.
    pub async fn retry(&mut self) -> Result<()> {
        self.api.retry_notebook(self.notebook_id).await?;
        if !self.is_polling_status() {
            self.start_status_poller(ProcessingStatus::InQueue);
        }
        info!(notebook_id = %self.notebook_id, "processing retry requested");
        Ok(())
    }

    /// Stop every poll loop and wait for them to finish.
    pub async fn unmount(mut self) {
        self.token.cancel();

        let mut handles: Vec<PollHandle> = self.artifacts.drain().map(|(_, h)| h).collect();
        handles.extend(self.status.take());
        join_all(handles.into_iter().map(PollHandle::join)).await;

        info!(notebook_id = %self.notebook_id, "notebook view unmounted");
    }
}

impl Drop for NotebookMonitor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
