use crate::rules::CorrectionApplied;
use crate::style::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    Generated,
    Corrected,
}

/// Immutable record of one produced text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub artifact_id: String,
    pub category: Category,
    pub kind: ArtifactKind,
    /// Prior artifact this one corrects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Instruction or draft the request carried.
    pub input: String,
    pub raw_text: String,
    pub final_text: String,
    pub corrections: Vec<CorrectionApplied>,
    pub style_profile_version: u64,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn word_count(&self) -> usize {
        self.final_text.split_whitespace().count()
    }
}

/// A rating a reviewer gave to an artifact. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub event_id: String,
    /// Position in the feedback log; `None` until the event is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<i64>,
    pub artifact_id: String,
    pub category: Category,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub applied_corrections: Vec<CorrectionApplied>,
}

impl FeedbackEvent {
    pub fn comment_text(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// One page of history, newest first.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<FeedbackEvent>,
    /// Cursor for the following page; `None` when history is exhausted.
    pub next_before: Option<i64>,
}
