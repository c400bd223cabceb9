use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// SQLite file. Relative paths resolve against the workspace; `~` is expanded.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Page size used when walking the feedback log.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
}

fn default_db_path() -> String {
    "brandvoice.db".into()
}

fn default_max_connections() -> u32 {
    4
}

fn default_history_page_size() -> usize {
    64
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_connections: default_max_connections(),
            history_page_size: default_history_page_size(),
        }
    }
}

impl StorageConfig {
    pub fn resolve_db_path(&self, workspace_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&self.db_path);
        let path = PathBuf::from(expanded.as_ref());
        if path.is_absolute() {
            path
        } else {
            workspace_dir.join(path)
        }
    }
}
