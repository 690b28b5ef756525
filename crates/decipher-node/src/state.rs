//! Application state.

use std::sync::Arc;

use decipher_core::Result;
use decipher_lifecycle::{HttpGenerationService, LifecycleController};
use decipher_store::InMemoryArtifactStore;

use crate::auth::{InMemorySessions, SessionVerifier};
use crate::config::NodeConfig;
use crate::storage::{LocalObjectStorage, ObjectStorage};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Notebook lifecycle operations.
    pub controller: LifecycleController,

    /// Session lookup for user routes.
    pub sessions: Arc<dyn SessionVerifier>,

    /// Where uploads are written.
    pub storage: Arc<dyn ObjectStorage>,

    /// Node configuration.
    pub config: Arc<NodeConfig>,
}

impl AppState {
    /// Wire up the default in-process components from configuration.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let store = Arc::new(InMemoryArtifactStore::new());
        let generator = Arc::new(HttpGenerationService::new(&config.research)?);
        let controller = LifecycleController::new(store, generator)
            .with_max_sources(config.limits.max_sources);
        let sessions = Arc::new(InMemorySessions::from_pairs(config.session_tokens.clone()));
        let storage = Arc::new(LocalObjectStorage::new(
            config.storage.root.clone(),
            config.storage.public_base_url.clone(),
        ));

        Ok(Self::from_parts(controller, sessions, storage, config))
    }

    /// Assemble state from explicit components.
    pub fn from_parts(
        controller: LifecycleController,
        sessions: Arc<dyn SessionVerifier>,
        storage: Arc<dyn ObjectStorage>,
        config: NodeConfig,
    ) -> Self {
        Self {
            controller,
            sessions,
            storage,
            config: Arc::new(config),
        }
    }
}
