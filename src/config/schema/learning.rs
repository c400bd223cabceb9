use serde::{Deserialize, Serialize};

/// Thresholds the learning pass folds feedback with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningConfig {
    /// Confidence given to a rule the first time feedback touches it.
    #[serde(default = "default_initial_confidence")]
    pub initial_confidence: f64,
    #[serde(default = "default_reinforce_step")]
    pub reinforce_step: f64,
    #[serde(default = "default_penalty_step")]
    pub penalty_step: f64,
    /// Below this a sufficiently penalized rule is deactivated.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_min_penalties")]
    pub min_penalties: u32,
    /// Distinct artifacts a term proposal needs before it is staged.
    #[serde(default = "default_candidate_min_support")]
    pub candidate_min_support: usize,
    #[serde(default = "default_example_promotion_rating")]
    pub example_promotion_rating: u8,
    /// Feedback-sourced examples kept per category.
    #[serde(default = "default_max_feedback_examples")]
    pub max_feedback_examples: usize,
    #[serde(default = "default_max_positive_notes")]
    pub max_positive_notes: usize,
    /// Rated artifacts whose last outcome stays revertible.
    #[serde(default = "default_max_tracked_outcomes")]
    pub max_tracked_outcomes: usize,
}

fn default_initial_confidence() -> f64 {
    0.5
}

fn default_reinforce_step() -> f64 {
    0.1
}

fn default_penalty_step() -> f64 {
    0.15
}

fn default_min_confidence() -> f64 {
    0.2
}

fn default_min_penalties() -> u32 {
    2
}

fn default_candidate_min_support() -> usize {
    3
}

fn default_example_promotion_rating() -> u8 {
    5
}

fn default_max_feedback_examples() -> usize {
    5
}

fn default_max_positive_notes() -> usize {
    10
}

fn default_max_tracked_outcomes() -> usize {
    1000
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            initial_confidence: default_initial_confidence(),
            reinforce_step: default_reinforce_step(),
            penalty_step: default_penalty_step(),
            min_confidence: default_min_confidence(),
            min_penalties: default_min_penalties(),
            candidate_min_support: default_candidate_min_support(),
            example_promotion_rating: default_example_promotion_rating(),
            max_feedback_examples: default_max_feedback_examples(),
            max_positive_notes: default_max_positive_notes(),
            max_tracked_outcomes: default_max_tracked_outcomes(),
        }
    }
}

impl LearningConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("initial_confidence", self.initial_confidence),
            ("min_confidence", self.min_confidence),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&value),
                "learning.{name} must be within 0.0..=1.0 (got {value})"
            );
        }
        for (name, value) in [
            ("reinforce_step", self.reinforce_step),
            ("penalty_step", self.penalty_step),
        ] {
            anyhow::ensure!(
                value > 0.0 && value <= 1.0,
                "learning.{name} must be within (0.0, 1.0] (got {value})"
            );
        }
        anyhow::ensure!(
            self.candidate_min_support >= 1,
            "learning.candidate_min_support must be at least 1"
        );
        anyhow::ensure!(
            (1..=5).contains(&self.example_promotion_rating),
            "learning.example_promotion_rating must be within 1..=5"
        );
        anyhow::ensure!(
            self.max_tracked_outcomes >= 1,
            "learning.max_tracked_outcomes must be at least 1"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LearningConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_support_is_rejected() {
        let config = LearningConfig {
            candidate_min_support: 0,
            ..LearningConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_table_fills_defaults() {
        let parsed: LearningConfig = toml::from_str("penalty_step = 0.3\n").unwrap();
        assert!((parsed.penalty_step - 0.3).abs() < f64::EPSILON);
        assert_eq!(parsed.min_penalties, 2);
        assert_eq!(parsed.candidate_min_support, 3);
        assert_eq!(parsed.max_tracked_outcomes, 1000);
    }
}
