use super::heuristics::extract_proposals;
use crate::config::LearningConfig;
use crate::error::ValidationError;
use crate::feedback::{FeedbackEvent, GeneratedArtifact};
use crate::style::{
    AppliedOutcome, Candidate, CandidateStatus, ExampleText, LengthPreference, RuleDelta, RuleId,
    RuleKind, RuleState, StyleProfile, normalize_term,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What one learning pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FoldReport {
    /// New events taken into the ledger, including superseded ones.
    pub folded: usize,
    /// Events already in the ledger.
    pub skipped: usize,
    /// Events that lost to a later rating of the same artifact.
    pub superseded: usize,
    pub reverted: usize,
    pub reinforced: usize,
    pub penalized: usize,
    pub deactivated: Vec<RuleId>,
    pub promoted: usize,
    pub staged: Vec<String>,
}

impl FoldReport {
    pub fn is_noop(&self) -> bool {
        self.folded == 0
    }
}

/// Pure fold of feedback events into a successor profile.
///
/// `artifacts` supplies the final text of rated artifacts; events whose
/// artifact is absent still adjust rule weights but cannot promote examples.
pub struct LearningPolicy<'c> {
    config: &'c LearningConfig,
}

impl<'c> LearningPolicy<'c> {
    pub fn new(config: &'c LearningConfig) -> Self {
        Self { config }
    }

    pub fn fold(
        &self,
        profile: &StyleProfile,
        events: &[FeedbackEvent],
        artifacts: &BTreeMap<String, GeneratedArtifact>,
    ) -> Result<(StyleProfile, FoldReport), ValidationError> {
        let mut report = FoldReport::default();

        let mut fresh: BTreeMap<&str, &FeedbackEvent> = BTreeMap::new();
        for event in events {
            if profile.ledger.has_folded(&event.event_id, event.seq) {
                report.skipped += 1;
            } else {
                fresh.entry(event.event_id.as_str()).or_insert(event);
            }
        }
        if fresh.is_empty() {
            return Ok((profile.clone(), report));
        }

        let mut next = profile.clone();
        next.version += 1;

        // Latest event per artifact wins; ties broken by event id.
        let mut authoritative: BTreeMap<&str, &FeedbackEvent> = BTreeMap::new();
        for event in fresh.values() {
            report.folded += 1;
            next.ledger.processed_events.insert(event.event_id.clone());
            match authoritative.get(event.artifact_id.as_str()) {
                Some(current) if order_key(current) >= order_key(event) => {
                    report.superseded += 1;
                }
                Some(_) => {
                    report.superseded += 1;
                    authoritative.insert(&event.artifact_id, event);
                }
                None => {
                    authoritative.insert(&event.artifact_id, event);
                }
            }
        }

        let mut ordered: Vec<&FeedbackEvent> = authoritative.into_values().collect();
        ordered.sort_by(|a, b| order_key(a).cmp(&order_key(b)));

        for event in ordered {
            if let Some(previous) = next.ledger.outcomes.get(&event.artifact_id) {
                if (previous.timestamp, previous.event_id.as_str()) >= order_key(event) {
                    report.superseded += 1;
                    continue;
                }
                let previous = previous.clone();
                self.revert(&mut next, &event.artifact_id, &previous);
                report.reverted += 1;
            }
            let outcome = self.apply(
                &mut next,
                event,
                artifacts.get(&event.artifact_id),
                &mut report,
            );
            next.ledger
                .outcomes
                .insert(event.artifact_id.clone(), outcome);
        }

        self.prune_outcomes(&mut next);
        self.stage_candidates(&mut next, &mut report);
        next.validate()?;
        Ok((next, report))
    }

    fn apply(
        &self,
        next: &mut StyleProfile,
        event: &FeedbackEvent,
        artifact: Option<&GeneratedArtifact>,
        report: &mut FoldReport,
    ) -> AppliedOutcome {
        let mut outcome = AppliedOutcome {
            event_id: event.event_id.clone(),
            timestamp: event.timestamp,
            rating: event.rating,
            rule_deltas: Vec::new(),
            promoted_example: false,
            note: None,
            observed_terms: Vec::new(),
        };

        let used: BTreeSet<&RuleId> = event
            .applied_corrections
            .iter()
            .map(|c| &c.rule_id)
            .filter(|id| next.declares_rule(id))
            .collect();

        if event.rating >= 4 {
            for id in used {
                outcome.rule_deltas.push(self.reinforce(next, id));
                report.reinforced += 1;
            }

            if let Some(note) = event.comment_text() {
                self.push_note(next, note);
                outcome.note = Some(note.to_string());
            }

            if let Some(artifact) = artifact {
                next.ledger.preferred_length =
                    LengthPreference::from_word_count(artifact.word_count());
                if event.rating >= self.config.example_promotion_rating {
                    outcome.promoted_example = self.promote(next, artifact);
                    if outcome.promoted_example {
                        report.promoted += 1;
                    }
                }
            }
        } else if event.rating <= 2 {
            for id in used {
                let delta = self.penalize(next, id);
                if delta.deactivated {
                    report.deactivated.push(id.clone());
                }
                outcome.rule_deltas.push(delta);
                report.penalized += 1;
            }

            if let Some(comment) = event.comment_text() {
                outcome.observed_terms = self.observe(next, event, comment);
            }
        }

        outcome
    }

    fn state<'p>(&self, next: &'p mut StyleProfile, id: &RuleId) -> &'p mut RuleState {
        next.rules
            .entry(id.clone())
            .or_insert_with(|| RuleState::new(self.config.initial_confidence))
    }

    fn reinforce(&self, next: &mut StyleProfile, id: &RuleId) -> RuleDelta {
        let step = self.config.reinforce_step;
        let state = self.state(next, id);
        let before = state.confidence;
        state.confidence = (before + step).min(1.0);
        state.reinforcements += 1;
        RuleDelta {
            rule_id: id.clone(),
            confidence: state.confidence - before,
            reinforced: true,
            penalized: false,
            deactivated: false,
        }
    }

    fn penalize(&self, next: &mut StyleProfile, id: &RuleId) -> RuleDelta {
        let version = next.version;
        let step = self.config.penalty_step;
        let min_confidence = self.config.min_confidence;
        let min_penalties = self.config.min_penalties;

        let state = self.state(next, id);
        let before = state.confidence;
        state.confidence = (before - step).max(0.0);
        state.penalties += 1;

        let deactivated = id.kind() != RuleKind::Structure
            && state.active
            && state.confidence < min_confidence
            && state.penalties >= min_penalties;
        if deactivated {
            state.active = false;
            state.deactivated_in = Some(version);
            tracing::info!(rule = id.as_str(), version, "rule deactivated by feedback");
        }

        RuleDelta {
            rule_id: id.clone(),
            confidence: state.confidence - before,
            reinforced: false,
            penalized: true,
            deactivated,
        }
    }

    fn push_note(&self, next: &mut StyleProfile, note: &str) {
        let notes = &mut next.ledger.positive_notes;
        notes.push(note.to_string());
        let overflow = notes.len().saturating_sub(self.config.max_positive_notes);
        notes.drain(..overflow);
    }

    fn promote(&self, next: &mut StyleProfile, artifact: &GeneratedArtifact) -> bool {
        let text = artifact.final_text.trim();
        if text.is_empty() || self.config.max_feedback_examples == 0 {
            return false;
        }
        let already = next
            .example_texts
            .iter()
            .any(|e| e.source_artifact.as_deref() == Some(artifact.artifact_id.as_str()));
        if already {
            return false;
        }

        next.example_texts.push(ExampleText {
            category: artifact.category,
            text: text.to_string(),
            occasion: None,
            source_artifact: Some(artifact.artifact_id.clone()),
        });

        let learned: Vec<usize> = next
            .example_texts
            .iter()
            .enumerate()
            .filter(|(_, e)| e.category == artifact.category && e.source_artifact.is_some())
            .map(|(index, _)| index)
            .collect();
        let overflow = learned.len().saturating_sub(self.config.max_feedback_examples);
        for index in learned.into_iter().take(overflow).rev() {
            next.example_texts.remove(index);
        }
        true
    }

    fn observe(&self, next: &mut StyleProfile, event: &FeedbackEvent, comment: &str) -> Vec<String> {
        let mut observed = Vec::new();
        for proposal in extract_proposals(comment) {
            let key = normalize_term(&proposal.discouraged);
            if let Some(current) = next.preferred_terms.get(&key) {
                let same = proposal
                    .preferred
                    .as_deref()
                    .is_none_or(|p| normalize_term(p) == normalize_term(current));
                if same {
                    continue;
                }
            }
            let observation = next.ledger.observations.entry(key.clone()).or_default();
            observation
                .proposals
                .insert(event.artifact_id.clone(), proposal.preferred);
            observation.evidence.push(event.event_id.clone());
            observed.push(key);
        }
        observed
    }

    fn revert(&self, next: &mut StyleProfile, artifact_id: &str, outcome: &AppliedOutcome) {
        for delta in &outcome.rule_deltas {
            if let Some(state) = next.rules.get_mut(&delta.rule_id) {
                state.confidence = (state.confidence - delta.confidence).clamp(0.0, 1.0);
                if delta.reinforced {
                    state.reinforcements = state.reinforcements.saturating_sub(1);
                }
                if delta.penalized {
                    state.penalties = state.penalties.saturating_sub(1);
                }
                if delta.deactivated && !state.active {
                    state.active = true;
                    state.deactivated_in = None;
                }
            }
        }

        if outcome.promoted_example {
            next.example_texts
                .retain(|e| e.source_artifact.as_deref() != Some(artifact_id));
        }

        if let Some(note) = &outcome.note
            && let Some(index) = next.ledger.positive_notes.iter().position(|n| n == note)
        {
            next.ledger.positive_notes.remove(index);
        }

        for term in &outcome.observed_terms {
            if let Some(observation) = next.ledger.observations.get_mut(term) {
                observation.proposals.remove(artifact_id);
                if observation.proposals.is_empty() {
                    next.ledger.observations.remove(term);
                }
            }
        }
    }

    /// Forget the oldest outcomes beyond the configured cap; a later rating
    /// of a forgotten artifact applies without reverting the earlier one.
    fn prune_outcomes(&self, next: &mut StyleProfile) {
        let outcomes = &mut next.ledger.outcomes;
        let overflow = outcomes.len().saturating_sub(self.config.max_tracked_outcomes);
        if overflow == 0 {
            return;
        }
        let mut by_age: Vec<(chrono::DateTime<chrono::Utc>, String, String)> = outcomes
            .iter()
            .map(|(artifact, o)| (o.timestamp, o.event_id.clone(), artifact.clone()))
            .collect();
        by_age.sort();
        for (_, _, artifact) in by_age.into_iter().take(overflow) {
            outcomes.remove(&artifact);
        }
        tracing::debug!(pruned = overflow, "outcome ledger trimmed");
    }

    fn stage_candidates(&self, next: &mut StyleProfile, report: &mut FoldReport) {
        let version = next.version;
        for (term, observation) in &next.ledger.observations {
            let support = observation.support();
            if support < self.config.candidate_min_support {
                continue;
            }
            let id = Candidate::id_for(term);
            match next.ledger.candidates.get_mut(&id) {
                Some(candidate) if candidate.status == CandidateStatus::Staged => {
                    candidate.support = support;
                    candidate.proposed = observation.best_proposal();
                    candidate.evidence.clone_from(&observation.evidence);
                }
                Some(_) => {}
                None => {
                    tracing::info!(candidate = id.as_str(), support, "candidate staged");
                    next.ledger.candidates.insert(
                        id.clone(),
                        Candidate {
                            id: id.clone(),
                            discouraged: term.clone(),
                            proposed: observation.best_proposal(),
                            support,
                            evidence: observation.evidence.clone(),
                            status: CandidateStatus::Staged,
                            staged_in: version,
                            resolved_in: None,
                            applied_term: None,
                        },
                    );
                    report.staged.push(id);
                }
            }
        }
    }
}

fn order_key(event: &FeedbackEvent) -> (chrono::DateTime<chrono::Utc>, &str) {
    (event.timestamp, event.event_id.as_str())
}
