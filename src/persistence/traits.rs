use crate::error::Result;
use crate::feedback::{EventPage, FeedbackEvent, GeneratedArtifact};
use crate::style::{Category, StyleProfile};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Durable state behind the engine: profile snapshots, artifacts and
/// feedback events.
///
/// Every write is atomic; a call that returns `Ok` has been persisted.
pub trait Persistence: Send + Sync {
    /// Latest profile snapshot, or `None` on a fresh store.
    fn load_profile(&self) -> Pin<Box<dyn Future<Output = Result<Option<StyleProfile>>> + Send + '_>>;

    /// Store a successor snapshot. Its version must be exactly one above the
    /// latest stored version (any version is accepted on a fresh store).
    fn save_profile<'a>(
        &'a self,
        profile: &'a StyleProfile,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Append one event and return its position in the log.
    fn append_event<'a>(
        &'a self,
        event: &'a FeedbackEvent,
    ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + 'a>>;

    fn append_artifact<'a>(
        &'a self,
        artifact: &'a GeneratedArtifact,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    fn load_artifact<'a>(
        &'a self,
        artifact_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeneratedArtifact>>> + Send + 'a>>;

    /// Events strictly older than `before_seq`, newest first.
    fn list_events_page(
        &self,
        category: Option<Category>,
        before_seq: Option<i64>,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<EventPage>> + Send + '_>>;

    /// Every event recorded against one artifact, oldest first.
    fn events_for_artifact<'a>(
        &'a self,
        artifact_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FeedbackEvent>>> + Send + 'a>>;

    /// `(version, saved_at)` for every stored snapshot, newest first.
    fn profile_versions(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<(u64, DateTime<Utc>)>>> + Send + '_>>;

    fn count_events(&self) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + '_>>;
}
