//! Wiring of the core components around one store and one profile handle.

use crate::backends::{FallbackChain, build_chain};
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::feedback::FeedbackStore;
use crate::generation::GenerationOrchestrator;
use crate::learning::LearningAdapter;
use crate::persistence::{Persistence, SqlitePersistence};
use crate::style::{ProfileHandle, StyleProfile};
use std::sync::Arc;

/// A ready-to-use engine: orchestrator, feedback log and learning adapter
/// sharing the same persistence and profile snapshot.
pub struct Engine {
    persistence: Arc<dyn Persistence>,
    handle: ProfileHandle,
    orchestrator: GenerationOrchestrator,
    feedback: FeedbackStore,
    learning: LearningAdapter,
}

impl Engine {
    /// Open the configured SQLite store, seeding the default profile on a
    /// fresh database.
    pub async fn open(config: &Config) -> Result<Self> {
        let persistence = SqlitePersistence::open_with(
            &config.database_path(),
            config.storage.max_connections,
        )
        .await?;
        Self::bootstrap(config, Arc::new(persistence), build_chain(config), None).await
    }

    /// Assemble an engine over `persistence`.
    ///
    /// The stored profile wins. `initial` (or the seed profile) is only saved
    /// when the store holds none. A stored profile that fails to parse or
    /// validate is fatal.
    pub async fn bootstrap(
        config: &Config,
        persistence: Arc<dyn Persistence>,
        chain: FallbackChain,
        initial: Option<StyleProfile>,
    ) -> Result<Self> {
        let profile = match persistence.load_profile().await? {
            Some(profile) => {
                tracing::debug!(version = profile.version, "style profile loaded");
                profile
            }
            None => {
                let profile = initial.unwrap_or_else(StyleProfile::seed);
                profile.validate().map_err(|e| StorageError::Corrupt {
                    what: "initial style profile".into(),
                    message: e.to_string(),
                })?;
                persistence.save_profile(&profile).await?;
                tracing::info!(version = profile.version, "style profile initialized");
                profile
            }
        };

        let handle = ProfileHandle::new(profile);
        let orchestrator = GenerationOrchestrator::new(
            handle.clone(),
            Arc::clone(&persistence),
            chain,
            config.generation.clone(),
        )?;
        let feedback = FeedbackStore::new(Arc::clone(&persistence))
            .with_page_size(config.storage.history_page_size);
        let learning = LearningAdapter::new(
            Arc::clone(&persistence),
            handle.clone(),
            config.learning.clone(),
        );

        Ok(Self {
            persistence,
            handle,
            orchestrator,
            feedback,
            learning,
        })
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    pub fn profile(&self) -> Arc<StyleProfile> {
        self.handle.snapshot()
    }

    pub fn handle(&self) -> &ProfileHandle {
        &self.handle
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    pub fn learning(&self) -> &LearningAdapter {
        &self.learning
    }
}
