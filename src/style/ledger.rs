use super::rules::RuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::Display;

/// Learning state carried inside the profile.
///
/// Everything the adapter needs to stay idempotent lives here: which events
/// were folded, what each artifact's authoritative event changed, and which
/// term proposals are waiting for a human decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningLedger {
    /// Every logged event with a sequence number up to this one is folded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folded_through: Option<i64>,
    /// Folded events the watermark does not cover yet.
    #[serde(default)]
    pub processed_events: BTreeSet<String>,
    /// Effect of the authoritative event per artifact id.
    #[serde(default)]
    pub outcomes: BTreeMap<String, AppliedOutcome>,
    /// Discouraged term -> support gathered from low-rated comments.
    #[serde(default)]
    pub observations: BTreeMap<String, TermObservation>,
    #[serde(default)]
    pub candidates: BTreeMap<String, Candidate>,
    #[serde(default)]
    pub positive_notes: Vec<String>,
    #[serde(default)]
    pub preferred_length: LengthPreference,
}

impl LearningLedger {
    pub fn has_folded(&self, event_id: &str, seq: Option<i64>) -> bool {
        let covered = matches!((seq, self.folded_through), (Some(seq), Some(through)) if seq <= through);
        covered || self.processed_events.contains(event_id)
    }

    /// Advance the watermark to `through` and drop the ids it now covers.
    pub fn compact<'e>(&mut self, through: i64, covered: impl IntoIterator<Item = &'e str>) {
        self.folded_through = self.folded_through.max(Some(through));
        for id in covered {
            self.processed_events.remove(id);
        }
    }

    pub fn staged_candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates
            .values()
            .filter(|c| c.status == CandidateStatus::Staged)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOutcome {
    pub event_id: String,
    /// Timestamp of the event, used to order superseding ratings.
    pub timestamp: DateTime<Utc>,
    pub rating: u8,
    #[serde(default)]
    pub rule_deltas: Vec<RuleDelta>,
    #[serde(default)]
    pub promoted_example: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub observed_terms: Vec<String>,
}

/// Exact change made to one rule, so it can be undone when superseded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDelta {
    pub rule_id: RuleId,
    pub confidence: f64,
    pub reinforced: bool,
    pub penalized: bool,
    #[serde(default)]
    pub deactivated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermObservation {
    /// Artifact id -> preferred term proposed by that artifact's comment.
    pub proposals: BTreeMap<String, Option<String>>,
    /// Event ids that contributed, in fold order.
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl TermObservation {
    pub fn support(&self) -> usize {
        self.proposals.len()
    }

    /// Most frequent proposal; ties go to the lexicographically smallest.
    pub fn best_proposal(&self) -> Option<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for proposal in self.proposals.values().flatten() {
            *counts.entry(proposal.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .fold(None::<(&str, usize)>, |best, (term, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((term, count)),
            })
            .map(|(term, _)| term.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidateStatus {
    Staged,
    Confirmed,
    Rejected,
}

/// Preferred-term proposal awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub discouraged: String,
    pub proposed: Option<String>,
    pub support: usize,
    pub evidence: Vec<String>,
    pub status: CandidateStatus,
    pub staged_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_term: Option<String>,
}

impl Candidate {
    pub fn id_for(discouraged: &str) -> String {
        format!("candidate:{discouraged}")
    }
}

/// Text length the reviewers keep rewarding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LengthPreference {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthPreference {
    pub fn from_word_count(words: usize) -> Self {
        if words < 100 {
            Self::Short
        } else if words > 250 {
            Self::Long
        } else {
            Self::Medium
        }
    }

    /// Word range hinted to backends.
    pub fn word_range(self) -> &'static str {
        match self {
            Self::Short => "80-120",
            Self::Medium => "150-250",
            Self::Long => "250-350",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_proposal_prefers_frequency_then_order() {
        let mut obs = TermObservation::default();
        obs.proposals.insert("a1".into(), Some("equipo".into()));
        obs.proposals.insert("a2".into(), Some("colaboradores".into()));
        obs.proposals.insert("a3".into(), None);
        assert_eq!(obs.best_proposal().as_deref(), Some("colaboradores"));

        obs.proposals.insert("a4".into(), Some("equipo".into()));
        assert_eq!(obs.best_proposal().as_deref(), Some("equipo"));
        assert_eq!(obs.support(), 4);
    }

    #[test]
    fn watermark_covers_sequenced_events_only() {
        let mut ledger = LearningLedger::default();
        ledger.processed_events.insert("e1".into());
        ledger.processed_events.insert("e2".into());
        ledger.processed_events.insert("manual".into());

        ledger.compact(2, ["e1", "e2"]);
        assert_eq!(ledger.folded_through, Some(2));
        assert_eq!(ledger.processed_events.len(), 1);
        assert!(ledger.has_folded("e1", Some(1)));
        assert!(ledger.has_folded("manual", None));
        assert!(!ledger.has_folded("e3", Some(3)));
        assert!(!ledger.has_folded("e1", None));

        ledger.compact(1, []);
        assert_eq!(ledger.folded_through, Some(2));
    }

    #[test]
    fn length_buckets() {
        assert_eq!(LengthPreference::from_word_count(40), LengthPreference::Short);
        assert_eq!(LengthPreference::from_word_count(180), LengthPreference::Medium);
        assert_eq!(LengthPreference::from_word_count(300), LengthPreference::Long);
    }
}
