pub mod store;
pub mod types;

pub use store::FeedbackStore;
pub use types::{ArtifactKind, EventPage, FeedbackEvent, GeneratedArtifact};
