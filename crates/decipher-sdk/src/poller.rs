//! Status pollers.
//!
//! Each poller is a spawned task that owns a [`CancellationToken`]. It
//! re-fetches the notebook on a fixed interval while the thing it watches is
//! still moving, emits exactly one [`Notification`] when that thing reaches a
//! terminal state, and then stops for good. Cancelling the token stops the
//! loop whether it is waiting for the next tick or in the middle of a fetch.

use std::sync::Arc;
use std::time::Duration;

use decipher_core::{ArtifactKind, ArtifactState, NotebookDetails, NotebookId, ProcessingStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::NotebookApi;

/// Polling intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Main processing status.
    pub status_interval: Duration,

    /// Mindmap and audio overview.
    pub artifact_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(5),
            artifact_interval: Duration::from_secs(3),
        }
    }
}

/// A terminal transition observed by a poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ProcessingComplete {
        notebook_id: NotebookId,
        title: String,
    },
    ProcessingFailed {
        notebook_id: NotebookId,
        title: String,
        message: Option<String>,
    },
    ArtifactReady {
        notebook_id: NotebookId,
        kind: ArtifactKind,
        payload: String,
    },
    ArtifactFailed {
        notebook_id: NotebookId,
        kind: ArtifactKind,
    },
}

impl Notification {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Notification::ProcessingComplete { .. } | Notification::ArtifactReady { .. }
        )
    }

    /// One-line text for a toast or log line.
    pub fn message(&self) -> String {
        match self {
            Notification::ProcessingComplete { title, .. } => {
                format!("Notebook \"{title}\" processing complete!")
            }
            Notification::ProcessingFailed { title, .. } => {
                format!("Error processing notebook \"{title}\"")
            }
            Notification::ArtifactReady { kind, .. } => format!("{} ready!", kind.display_name()),
            Notification::ArtifactFailed { kind, .. } => {
                format!("{} generation failed", kind.display_name())
            }
        }
    }
}

/// Why a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// A terminal state was observed and notified.
    Terminal,
    /// Nothing to watch: the starting state was already settled.
    Idle,
    /// The owning view went away.
    Cancelled,
}

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<PollExit>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end.
    pub async fn join(self) -> PollExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(err) => {
                warn!(error = %err, "poll task did not complete");
                PollExit::Cancelled
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Wait for the next tick and fetch, giving up as soon as `token` is cancelled.
async fn next_snapshot(
    api: &dyn NotebookApi,
    notebook_id: NotebookId,
    ticker: &mut Interval,
    token: &CancellationToken,
) -> Option<Option<NotebookDetails>> {
    tokio::select! {
        biased;
        _ = token.cancelled() => return None,
        _ = ticker.tick() => {}
    }

    let fetched = tokio::select! {
        biased;
        _ = token.cancelled() => return None,
        fetched = api.fetch_notebook(notebook_id) => fetched,
    };

    match fetched {
        Ok(details) => Some(Some(details)),
        Err(err) => {
            warn!(notebook_id = %notebook_id, error = %err, "poll fetch failed");
            Some(None)
        }
    }
}

async fn notify(notifications: &mpsc::Sender<Notification>, notification: Notification) {
    if notifications.send(notification).await.is_err() {
        debug!("notification receiver dropped");
    }
}

/// Watches main processing status.
pub struct StatusPoller {
    api: Arc<dyn NotebookApi>,
    notebook_id: NotebookId,
    interval: Duration,
    notifications: mpsc::Sender<Notification>,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn NotebookApi>,
        notebook_id: NotebookId,
        interval: Duration,
        notifications: mpsc::Sender<Notification>,
    ) -> Self {
        Self {
            api,
            notebook_id,
            interval,
            notifications,
        }
    }

    pub fn spawn(self, initial: ProcessingStatus, token: CancellationToken) -> PollHandle {
        let task = tokio::spawn(self.run(initial, token.clone()));
        PollHandle { token, task }
    }

    /// Poll while the status is `IN_QUEUE` or `IN_PROGRESS`.
    ///
    /// Only an observed move from an active status into a terminal one is
    /// notified; starting on a terminal status returns [`PollExit::Idle`].
    pub async fn run(self, initial: ProcessingStatus, token: CancellationToken) -> PollExit {
        if !initial.is_active() {
            return PollExit::Idle;
        }

        info!(notebook_id = %self.notebook_id, "status poller started");
        let mut previous = initial;
        let mut ticker = ticker(self.interval);

        loop {
            let Some(snapshot) =
                next_snapshot(self.api.as_ref(), self.notebook_id, &mut ticker, &token).await
            else {
                info!(notebook_id = %self.notebook_id, "status poller cancelled");
                return PollExit::Cancelled;
            };
            let Some(details) = snapshot else { continue };

            let status = details.status();
            if previous.is_active() && status.is_terminal() {
                let title = details.display_title().to_string();
                let notification = match status {
                    ProcessingStatus::Processed => Notification::ProcessingComplete {
                        notebook_id: self.notebook_id,
                        title,
                    },
                    _ => Notification::ProcessingFailed {
                        notebook_id: self.notebook_id,
                        title,
                        message: details.status_message().map(str::to_string),
                    },
                };
                info!(notebook_id = %self.notebook_id, status = %status, "processing reached terminal status");
                notify(&self.notifications, notification).await;
                return PollExit::Terminal;
            }
            previous = status;
        }
    }
}

/// Watches one derived artifact.
pub struct ArtifactPoller {
    api: Arc<dyn NotebookApi>,
    notebook_id: NotebookId,
    kind: ArtifactKind,
    interval: Duration,
    notifications: mpsc::Sender<Notification>,
}

impl ArtifactPoller {
    pub fn new(
        api: Arc<dyn NotebookApi>,
        notebook_id: NotebookId,
        kind: ArtifactKind,
        interval: Duration,
        notifications: mpsc::Sender<Notification>,
    ) -> Self {
        Self {
            api,
            notebook_id,
            kind,
            interval,
            notifications,
        }
    }

    pub fn spawn(self, initial: ArtifactState, token: CancellationToken) -> PollHandle {
        let task = tokio::spawn(self.run(initial, token.clone()));
        PollHandle { token, task }
    }

    /// Poll while the artifact is `IN_PROGRESS`.
    ///
    /// A fetch that shows no value at all keeps the loop going; only a payload
    /// or `ERROR` ends it.
    pub async fn run(self, initial: ArtifactState, token: CancellationToken) -> PollExit {
        if !initial.is_in_progress() {
            return PollExit::Idle;
        }

        info!(notebook_id = %self.notebook_id, artifact = %self.kind, "artifact poller started");
        let mut ticker = ticker(self.interval);

        loop {
            let Some(snapshot) =
                next_snapshot(self.api.as_ref(), self.notebook_id, &mut ticker, &token).await
            else {
                info!(notebook_id = %self.notebook_id, artifact = %self.kind, "artifact poller cancelled");
                return PollExit::Cancelled;
            };
            let Some(details) = snapshot else { continue };

            let state = details
                .output
                .as_ref()
                .map(|output| output.artifact(self.kind).clone())
                .unwrap_or_default();

            let notification = match state {
                ArtifactState::Ready(payload) => Notification::ArtifactReady {
                    notebook_id: self.notebook_id,
                    kind: self.kind,
                    payload,
                },
                ArtifactState::Failed => Notification::ArtifactFailed {
                    notebook_id: self.notebook_id,
                    kind: self.kind,
                },
                ArtifactState::InProgress | ArtifactState::Absent => continue,
            };

            info!(notebook_id = %self.notebook_id, artifact = %self.kind, "artifact reached terminal state");
            notify(&self.notifications, notification).await;
            return PollExit::Terminal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{details, with_artifact, ScriptedApi};
    use decipher_core::DecipherError;

    fn channel() -> (mpsc::Sender<Notification>, mpsc::Receiver<Notification>) {
        mpsc::channel(8)
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_flip_notifies_once_with_title() {
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(details(ProcessingStatus::InProgress)),
            Ok(details(ProcessingStatus::Processed)),
        ]));
        let (tx, mut rx) = channel();
        let id = api.notebook_id();

        let poller = StatusPoller::new(api.clone(), id, Duration::from_secs(5), tx);
        let exit = poller
            .run(ProcessingStatus::InQueue, CancellationToken::new())
            .await;

        assert_eq!(exit, PollExit::Terminal);
        assert_eq!(
            rx.recv().await,
            Some(Notification::ProcessingComplete {
                notebook_id: id,
                title: "Quantum Computing Basics".to_string(),
            })
        );
        assert!(rx.recv().await.is_none());
        assert_eq!(api.fetches(), 2);

        // Nothing polls after the terminal state.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_carries_status_message() {
        let mut failed = details(ProcessingStatus::Error);
        if let Some(status) = failed.processing_status.as_mut() {
            status.message = Some("crawler timed out".to_string());
        }
        let api = Arc::new(ScriptedApi::new(vec![Ok(failed)]));
        let (tx, mut rx) = channel();

        StatusPoller::new(api.clone(), api.notebook_id(), Duration::from_secs(5), tx)
            .run(ProcessingStatus::InProgress, CancellationToken::new())
            .await;

        match rx.recv().await {
            Some(Notification::ProcessingFailed { message, .. }) => {
                assert_eq!(message.as_deref(), Some("crawler timed out"));
            }
            other => panic!("expected ProcessingFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_terminal_status_is_silent() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(details(ProcessingStatus::Processed))]));
        let (tx, mut rx) = channel();

        let exit = StatusPoller::new(api.clone(), api.notebook_id(), Duration::from_secs(5), tx)
            .run(ProcessingStatus::Processed, CancellationToken::new())
            .await;

        assert_eq!(exit, PollExit::Idle);
        assert!(rx.recv().await.is_none());
        assert_eq!(api.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_waits_one_interval() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(details(ProcessingStatus::InProgress))]));
        let (tx, _rx) = channel();
        let token = CancellationToken::new();

        let handle = StatusPoller::new(api.clone(), api.notebook_id(), Duration::from_secs(5), tx)
            .spawn(ProcessingStatus::InQueue, token.clone());

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(api.fetches(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(api.fetches(), 1);

        handle.cancel();
        assert_eq!(handle.join().await, PollExit::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_keep_polling_until_cancelled() {
        let api = Arc::new(ScriptedApi::new(vec![Err(DecipherError::notebook_not_found("gone"))]));
        let (tx, mut rx) = channel();
        let token = CancellationToken::new();

        let handle = ArtifactPoller::new(
            api.clone(),
            api.notebook_id(),
            ArtifactKind::Mindmap,
            Duration::from_secs(3),
            tx,
        )
        .spawn(ArtifactState::InProgress, token.clone());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.fetches(), 3);
        assert!(!handle.is_finished());

        token.cancel();
        assert_eq!(handle.join().await, PollExit::Cancelled);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_artifact_ready_after_absent_read() {
        let processed = details(ProcessingStatus::Processed);
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(processed.clone()),
            Ok(with_artifact(processed.clone(), ArtifactKind::AudioOverview, ArtifactState::InProgress)),
            Ok(with_artifact(
                processed,
                ArtifactKind::AudioOverview,
                ArtifactState::Ready("https://cdn.example.com/a.mp3".to_string()),
            )),
        ]));
        let (tx, mut rx) = channel();

        let exit = ArtifactPoller::new(
            api.clone(),
            api.notebook_id(),
            ArtifactKind::AudioOverview,
            Duration::from_secs(3),
            tx,
        )
        .run(ArtifactState::InProgress, CancellationToken::new())
        .await;

        assert_eq!(exit, PollExit::Terminal);
        assert_eq!(api.fetches(), 3);
        let notification = rx.recv().await.unwrap();
        assert!(notification.is_success());
        assert_eq!(notification.message(), "Audio overview ready!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_artifact_error_notifies_failure() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(with_artifact(
            details(ProcessingStatus::Processed),
            ArtifactKind::Mindmap,
            ArtifactState::Failed,
        ))]));
        let (tx, mut rx) = channel();
        let id = api.notebook_id();

        ArtifactPoller::new(api.clone(), id, ArtifactKind::Mindmap, Duration::from_secs(3), tx)
            .run(ArtifactState::InProgress, CancellationToken::new())
            .await;

        assert_eq!(
            rx.recv().await,
            Some(Notification::ArtifactFailed {
                notebook_id: id,
                kind: ArtifactKind::Mindmap,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_slow_fetch() {
        let api = Arc::new(
            ScriptedApi::new(vec![Ok(details(ProcessingStatus::InProgress))])
                .with_latency(Duration::from_secs(30)),
        );
        let (tx, _rx) = channel();
        let token = CancellationToken::new();

        let handle = StatusPoller::new(api.clone(), api.notebook_id(), Duration::from_secs(5), tx)
            .spawn(ProcessingStatus::InProgress, token.clone());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(api.fetches(), 1);
        token.cancel();
        assert_eq!(handle.join().await, PollExit::Cancelled);
    }
}
