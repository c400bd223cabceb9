use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(backend) = std::env::var("BRANDVOICE_BACKEND")
            && !backend.is_empty()
        {
            self.preferred_backend = Some(backend);
        }

        if let Ok(workspace) = std::env::var("BRANDVOICE_WORKSPACE")
            && !workspace.is_empty()
        {
            self.workspace_dir = PathBuf::from(workspace);
        }

        if let Ok(db_path) = std::env::var("BRANDVOICE_DB_PATH")
            && !db_path.is_empty()
        {
            self.storage.db_path = db_path;
        }

        if let Ok(level) = std::env::var("BRANDVOICE_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }

        if let Ok(temp_str) = std::env::var("BRANDVOICE_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.generation.generate_temperature = temp;
        }

        if let Ok(secs_str) = std::env::var("BRANDVOICE_TIMEOUT_SECS")
            && let Ok(secs) = secs_str.parse::<u64>()
            && secs > 0
        {
            for entry in self.backends.providers.values_mut() {
                entry.timeout_secs = secs;
            }
        }
    }
}
