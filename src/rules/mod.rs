pub mod casing;
pub mod engine;
pub mod matcher;
pub mod structure;

pub use engine::{ApplyMode, CorrectionApplied, DEFAULT_PLACEHOLDER, RuleEngine, RuleOutcome};
