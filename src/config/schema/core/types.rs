use super::super::{
    BackendsConfig, GenerationConfig, LearningConfig, ObservabilityConfig, StorageConfig,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Backend tried before `backends.fallback_order`.
    #[serde(default)]
    pub preferred_backend: Option<String>,

    #[serde(default)]
    pub backends: BackendsConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub learning: LearningConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        let home = directories::UserDirs::new()
            .map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let brandvoice_dir = home.join(".brandvoice");

        Self {
            workspace_dir: brandvoice_dir.join("workspace"),
            config_path: brandvoice_dir.join("config.toml"),
            preferred_backend: None,
            backends: BackendsConfig::default(),
            generation: GenerationConfig::default(),
            learning: LearningConfig::default(),
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.storage.resolve_db_path(&self.workspace_dir)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(preferred) = &self.preferred_backend {
            anyhow::ensure!(
                preferred == "simulator" || self.backends.providers.contains_key(preferred),
                "preferred_backend '{preferred}' is not configured"
            );
        }
        self.backends.validate()?;
        self.generation.validate()?;
        self.learning.validate()?;
        Ok(())
    }
}
