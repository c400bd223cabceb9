pub mod adapter;
pub mod heuristics;
pub mod policy;

pub use adapter::{LearningAdapter, LearningUpdate};
pub use heuristics::{TermProposal, extract_proposals};
pub use policy::{FoldReport, LearningPolicy};
