//! Notebook creation saga.
//!
//! Creation spans a local transaction and a remote call, so it runs in two
//! phases:
//!
//! 1. [`CreationSaga::reserve`] inserts notebook, sources and an `IN_QUEUE`
//!    status in one store transaction.
//! 2. [`CreationSaga::confirm`] triggers research. If the trigger fails the
//!    reservation is compensated by deleting the notebook.
//!
//! Every way the saga can end is a [`SagaOutcome`] variant.

use std::sync::Arc;

use decipher_core::notebook::MSG_CREATED;
use decipher_core::{
    default_title, DecipherError, NotebookDetails, NotebookDraft, NotebookId, ResearchRequest,
    Result, StatusRecord, UserId,
};
use decipher_store::{ArtifactStore, NewNotebook};
use tracing::{error, info, warn};

use crate::trigger::GenerationService;

/// A notebook that exists locally but whose research has not been confirmed.
#[derive(Debug)]
#[must_use = "a reservation must be confirmed or rolled back"]
pub struct Reservation {
    owner: UserId,
    details: NotebookDetails,
    research: Option<ResearchRequest>,
}

impl Reservation {
    pub fn notebook_id(&self) -> NotebookId {
        self.details.notebook.id
    }

    pub fn details(&self) -> &NotebookDetails {
        &self.details
    }

    /// What will be sent to the research service, if anything.
    pub fn research_request(&self) -> Option<&ResearchRequest> {
        self.research.as_ref()
    }
}

/// How a creation saga ended.
#[derive(Debug)]
pub enum SagaOutcome {
    /// Research was acknowledged.
    Confirmed(NotebookDetails),

    /// Nothing to research; the notebook was kept without a remote call.
    Unscheduled(NotebookDetails),

    /// The trigger failed and the notebook was deleted.
    RolledBack {
        notebook_id: NotebookId,
        cause: DecipherError,
    },

    /// The trigger failed and so did the compensating delete.
    RollbackFailed {
        notebook_id: NotebookId,
        cause: DecipherError,
        rollback_error: DecipherError,
    },
}

impl SagaOutcome {
    /// Collapse to what the caller of `createNotebook` sees.
    pub fn into_result(self) -> Result<NotebookDetails> {
        match self {
            SagaOutcome::Confirmed(details) | SagaOutcome::Unscheduled(details) => Ok(details),
            SagaOutcome::RolledBack { cause, .. } => Err(cause),
            SagaOutcome::RollbackFailed { cause, .. } => Err(cause),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, SagaOutcome::Confirmed(_) | SagaOutcome::Unscheduled(_))
    }
}

/// Two-phase creation of a notebook.
#[derive(Clone)]
pub struct CreationSaga {
    store: Arc<dyn ArtifactStore>,
    generator: Arc<dyn GenerationService>,
}

impl CreationSaga {
    pub fn new(store: Arc<dyn ArtifactStore>, generator: Arc<dyn GenerationService>) -> Self {
        Self { store, generator }
    }

    /// Phase one: write everything locally in a single transaction.
    pub async fn reserve(&self, owner: &UserId, draft: NotebookDraft) -> Result<Reservation> {
        let existing = self.store.count_notebooks(owner).await?;
        let needs_research = draft.needs_research();
        let (topic, sources) = draft.into_parts();

        let details = self
            .store
            .insert_notebook(NewNotebook {
                owner: owner.clone(),
                title: Some(default_title(existing)),
                topic: topic.clone(),
                sources: sources.clone(),
                status: StatusRecord::queued(MSG_CREATED),
            })
            .await?;

        let research = needs_research
            .then(|| ResearchRequest::new(details.notebook.id, topic, &sources));

        info!(notebook_id = %details.notebook.id, owner = %owner, "reserved notebook");
        Ok(Reservation {
            owner: owner.clone(),
            details,
            research,
        })
    }

    /// Phase two: trigger research, compensating on failure.
    pub async fn confirm(&self, reservation: Reservation) -> SagaOutcome {
        let Some(request) = reservation.research.as_ref() else {
            warn!(
                notebook_id = %reservation.notebook_id(),
                "nothing to research, keeping notebook without triggering"
            );
            return SagaOutcome::Unscheduled(reservation.details);
        };

        match self.generator.start_research(request).await {
            Ok(()) => {
                info!(notebook_id = %reservation.notebook_id(), "research queued");
                SagaOutcome::Confirmed(reservation.details)
            }
            Err(cause) => {
                warn!(
                    notebook_id = %reservation.notebook_id(),
                    error = %cause,
                    "research trigger failed, rolling back notebook"
                );
                self.rollback(reservation, cause).await
            }
        }
    }

    /// Compensate a reservation by deleting the notebook.
    pub async fn rollback(&self, reservation: Reservation, cause: DecipherError) -> SagaOutcome {
        let notebook_id = reservation.notebook_id();
        match self.store.delete_notebook(notebook_id, &reservation.owner).await {
            Ok(_) => {
                info!(notebook_id = %notebook_id, "rolled back notebook");
                SagaOutcome::RolledBack { notebook_id, cause }
            }
            Err(rollback_error) => {
                error!(
                    notebook_id = %notebook_id,
                    error = %rollback_error,
                    "rollback failed, notebook is orphaned"
                );
                SagaOutcome::RollbackFailed {
                    notebook_id,
                    cause,
                    rollback_error,
                }
            }
        }
    }

    /// Reserve then confirm.
    pub async fn run(&self, owner: &UserId, draft: NotebookDraft) -> Result<SagaOutcome> {
        let reservation = self.reserve(owner, draft).await?;
        Ok(self.confirm(reservation).await)
    }
}
