pub mod approach;
pub mod context;
pub mod orchestrator;
pub mod prompt;

pub use approach::Approach;
pub use context::{PromptContext, TermHint};
pub use orchestrator::GenerationOrchestrator;
pub use prompt::PromptTemplates;
