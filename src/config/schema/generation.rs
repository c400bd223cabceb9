use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Category examples rendered into each prompt.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    /// Positive reviewer notes rendered into each prompt.
    #[serde(default = "default_max_notes")]
    pub max_notes: usize,
    #[serde(default = "default_generate_temperature")]
    pub generate_temperature: f64,
    #[serde(default = "default_generate_max_tokens")]
    pub generate_max_tokens: usize,
    #[serde(default = "default_correct_temperature")]
    pub correct_temperature: f64,
    #[serde(default = "default_correct_max_tokens")]
    pub correct_max_tokens: usize,
    /// Variants produced by `generate --options` when no count is given.
    #[serde(default = "default_option_count")]
    pub option_count: usize,
    /// Body line of an inserted section stub.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_max_examples() -> usize {
    3
}

fn default_max_notes() -> usize {
    3
}

fn default_generate_temperature() -> f64 {
    0.8
}

fn default_generate_max_tokens() -> usize {
    800
}

fn default_correct_temperature() -> f64 {
    0.3
}

fn default_correct_max_tokens() -> usize {
    1000
}

fn default_option_count() -> usize {
    3
}

fn default_placeholder() -> String {
    crate::rules::DEFAULT_PLACEHOLDER.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_examples: default_max_examples(),
            max_notes: default_max_notes(),
            generate_temperature: default_generate_temperature(),
            generate_max_tokens: default_generate_max_tokens(),
            correct_temperature: default_correct_temperature(),
            correct_max_tokens: default_correct_max_tokens(),
            option_count: default_option_count(),
            placeholder: default_placeholder(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("generate_temperature", self.generate_temperature),
            ("correct_temperature", self.correct_temperature),
        ] {
            anyhow::ensure!(
                (0.0..=2.0).contains(&value),
                "generation.{name} must be within 0.0..=2.0 (got {value})"
            );
        }
        anyhow::ensure!(
            self.generate_max_tokens > 0 && self.correct_max_tokens > 0,
            "generation max token limits must be positive"
        );
        anyhow::ensure!(
            !self.placeholder.trim().is_empty(),
            "generation.placeholder must not be empty"
        );
        Ok(())
    }
}
