#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use brandvoice::backends::FallbackChain;
use brandvoice::feedback::GeneratedArtifact;
use brandvoice::persistence::{Persistence, SqlitePersistence};
use brandvoice::style::{Category, StyleProfile};
use brandvoice::{Config, Engine};

pub const MIN_RESPONSE_CHARS: usize = 20;

/// Config rooted at `workspace` that never leaves the process.
pub fn simulator_config(workspace: &Path) -> Config {
    let mut config = Config::default();
    config.workspace_dir = workspace.to_path_buf();
    config.config_path = workspace.join("config.toml");
    config.preferred_backend = Some("simulator".into());
    config
}

pub async fn memory_store() -> Arc<dyn Persistence> {
    Arc::new(
        SqlitePersistence::open_in_memory()
            .await
            .expect("in-memory store"),
    )
}

/// Engine over a fresh in-memory store whose chain is the simulator alone.
pub async fn memory_engine(profile: Option<StyleProfile>) -> (Engine, Arc<dyn Persistence>) {
    let persistence = memory_store().await;
    let engine = Engine::bootstrap(
        &Config::default(),
        Arc::clone(&persistence),
        FallbackChain::new(MIN_RESPONSE_CHARS),
        profile,
    )
    .await
    .expect("bootstrap engine");
    (engine, persistence)
}

/// Seed profile with the given discouraged terms removed.
pub fn profile_without(keys: &[&str]) -> StyleProfile {
    let mut profile = StyleProfile::seed();
    for key in keys {
        profile.preferred_terms.remove(*key);
    }
    profile
}

/// Produce one corrected artifact the reviewers can rate.
pub async fn corrected(engine: &Engine, draft: &str) -> GeneratedArtifact {
    engine
        .orchestrator()
        .correct(draft, Category::InternalCommunication)
        .await
        .expect("correct draft")
}
