pub mod category;
pub mod handle;
pub mod ledger;
pub mod profile;
pub mod rules;

pub use category::Category;
pub use handle::ProfileHandle;
pub use ledger::{
    AppliedOutcome, Candidate, CandidateStatus, LearningLedger, LengthPreference, RuleDelta,
    TermObservation,
};
pub use profile::{ExampleText, StyleProfile};
pub use rules::{RuleId, RuleKind, RuleState, normalize_term};
