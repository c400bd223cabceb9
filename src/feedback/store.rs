use super::types::FeedbackEvent;
use crate::error::{ReferentialError, Result, ValidationError};
use crate::persistence::Persistence;
use crate::style::Category;
use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: usize = 64;

/// Append-only log of reviewer ratings.
pub struct FeedbackStore {
    persistence: Arc<dyn Persistence>,
    page_size: usize,
}

impl FeedbackStore {
    pub fn new(persistence: Arc<dyn Persistence>) -> Self {
        Self {
            persistence,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Record a rating for an artifact the system produced.
    ///
    /// The event is durable once this returns. It inherits the artifact's
    /// category and correction list so learning never has to join back.
    pub async fn record_feedback(
        &self,
        artifact_id: &str,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<FeedbackEvent> {
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or(ValidationError::RatingOutOfRange { rating })?;

        let artifact = self
            .persistence
            .load_artifact(artifact_id)
            .await?
            .ok_or_else(|| ReferentialError::UnknownArtifact {
                artifact_id: artifact_id.to_string(),
            })?;

        let mut event = FeedbackEvent {
            event_id: Uuid::new_v4().to_string(),
            seq: None,
            artifact_id: artifact.artifact_id,
            category: artifact.category,
            rating,
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
            timestamp: Utc::now(),
            applied_corrections: artifact.corrections,
        };
        event.seq = Some(self.persistence.append_event(&event).await?);

        tracing::info!(
            artifact_id = event.artifact_id.as_str(),
            event_id = event.event_id.as_str(),
            rating,
            "feedback recorded"
        );
        Ok(event)
    }

    /// Lazy, newest-first walk over the log. Each call starts from the top.
    pub fn history(&self, category: Option<Category>) -> BoxStream<'static, Result<FeedbackEvent>> {
        let persistence = Arc::clone(&self.persistence);
        let page_size = self.page_size;
        Box::pin(async_stream::stream! {
            let mut before = None;
            loop {
                let page = match persistence.list_events_page(category, before, page_size).await {
                    Ok(page) => page,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                };
                for event in page.events {
                    yield Ok(event);
                }
                match page.next_before {
                    Some(next) => before = Some(next),
                    None => break,
                }
            }
        })
    }

    /// Materialize at most `limit` events of [`FeedbackStore::history`].
    pub async fn recent(
        &self,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<FeedbackEvent>> {
        self.history(category).take(limit).try_collect().await
    }

    /// Full audit trail of one artifact, oldest first.
    pub async fn events_for(&self, artifact_id: &str) -> Result<Vec<FeedbackEvent>> {
        self.persistence.events_for_artifact(artifact_id).await
    }
}
