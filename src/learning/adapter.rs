use super::policy::{FoldReport, LearningPolicy};
use crate::config::LearningConfig;
use crate::error::{ConcurrencyError, Result, ValidationError};
use crate::feedback::{FeedbackEvent, FeedbackStore, GeneratedArtifact};
use crate::persistence::Persistence;
use crate::style::{CandidateStatus, ProfileHandle, RuleId, RuleKind, RuleState, StyleProfile};
use futures_util::TryStreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a learning pass.
#[derive(Debug, Clone)]
pub struct LearningUpdate {
    pub profile: Arc<StyleProfile>,
    pub report: FoldReport,
}

/// The only writer of style profiles.
///
/// Every transition checks that the caller saw the current version, persists
/// the successor, then publishes it to the shared [`ProfileHandle`].
pub struct LearningAdapter {
    persistence: Arc<dyn Persistence>,
    handle: ProfileHandle,
    config: LearningConfig,
    commit: Mutex<()>,
}

impl LearningAdapter {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        handle: ProfileHandle,
        config: LearningConfig,
    ) -> Self {
        Self {
            persistence,
            handle,
            config,
            commit: Mutex::new(()),
        }
    }

    pub fn handle(&self) -> &ProfileHandle {
        &self.handle
    }

    /// Fold `events` into a successor of `profile`.
    ///
    /// Replaying events the ledger already holds returns the current
    /// snapshot untouched.
    pub async fn update(
        &self,
        profile: &StyleProfile,
        events: &[FeedbackEvent],
    ) -> Result<LearningUpdate> {
        let _guard = self.commit.lock().await;
        self.ensure_current(profile)?;
        self.fold_and_commit(profile, events, None).await
    }

    /// History events the ledger of `profile` has not folded yet, oldest first.
    pub async fn pending_events(
        &self,
        profile: &StyleProfile,
        store: &FeedbackStore,
    ) -> Result<Vec<FeedbackEvent>> {
        let ledger = &profile.ledger;
        let mut pending: Vec<FeedbackEvent> = store
            .history(None)
            .try_filter(|event| std::future::ready(!ledger.has_folded(&event.event_id, event.seq)))
            .try_collect()
            .await?;
        pending.reverse();
        Ok(pending)
    }

    /// Fold everything pending against the current snapshot.
    ///
    /// A committed pass moves the ledger watermark to the newest logged
    /// event, so replay protection no longer needs each event id.
    pub async fn learn_pending(&self, store: &FeedbackStore) -> Result<LearningUpdate> {
        let logged: Vec<FeedbackEvent> = store.history(None).try_collect().await?;
        let _guard = self.commit.lock().await;
        let profile = self.handle.snapshot();

        let pending: Vec<FeedbackEvent> = logged
            .iter()
            .rev()
            .filter(|event| !profile.ledger.has_folded(&event.event_id, event.seq))
            .cloned()
            .collect();
        let watermark = logged
            .iter()
            .filter_map(|event| event.seq)
            .max()
            .map(|through| (through, logged.as_slice()));
        self.fold_and_commit(&profile, &pending, watermark).await
    }

    async fn fold_and_commit(
        &self,
        profile: &StyleProfile,
        events: &[FeedbackEvent],
        watermark: Option<(i64, &[FeedbackEvent])>,
    ) -> Result<LearningUpdate> {
        let artifacts = self.load_artifacts(profile, events).await?;
        let (mut next, report) =
            LearningPolicy::new(&self.config).fold(profile, events, &artifacts)?;
        if report.is_noop() {
            return Ok(LearningUpdate {
                profile: self.handle.snapshot(),
                report,
            });
        }

        if let Some((through, logged)) = watermark {
            let covered = logged
                .iter()
                .filter(|event| event.seq.is_some_and(|seq| seq <= through))
                .map(|event| event.event_id.as_str());
            next.ledger.compact(through, covered);
        }

        let profile = self.commit(next).await?;
        tracing::info!(
            version = profile.version,
            folded = report.folded,
            reinforced = report.reinforced,
            penalized = report.penalized,
            staged = report.staged.len(),
            "learning pass committed"
        );
        Ok(LearningUpdate { profile, report })
    }

    /// Turn a staged candidate into a preferred term.
    ///
    /// `preferred` overrides the term reviewers proposed.
    pub async fn confirm_candidate(
        &self,
        profile: &StyleProfile,
        candidate_id: &str,
        preferred: Option<&str>,
    ) -> Result<Arc<StyleProfile>> {
        let _guard = self.commit.lock().await;
        self.ensure_current(profile)?;

        let candidate = staged_candidate(profile, candidate_id)?;
        let term = preferred
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .or_else(|| candidate.proposed.clone())
            .ok_or_else(|| ValidationError::MissingPreferredTerm {
                id: candidate_id.to_string(),
            })?;
        let discouraged = candidate.discouraged.clone();

        let mut next = profile.clone();
        next.version += 1;
        next.insert_preferred_term(&discouraged, &term)?;
        next.rules.insert(
            RuleId::term(&discouraged),
            RuleState::new(self.config.initial_confidence),
        );
        if let Some(candidate) = next.ledger.candidates.get_mut(candidate_id) {
            candidate.status = CandidateStatus::Confirmed;
            candidate.resolved_in = Some(next.version);
            candidate.applied_term = Some(term.clone());
        }

        let profile = self.commit(next).await?;
        tracing::info!(
            version = profile.version,
            candidate = candidate_id,
            term = term.as_str(),
            "candidate confirmed"
        );
        Ok(profile)
    }

    pub async fn reject_candidate(
        &self,
        profile: &StyleProfile,
        candidate_id: &str,
    ) -> Result<Arc<StyleProfile>> {
        let _guard = self.commit.lock().await;
        self.ensure_current(profile)?;
        staged_candidate(profile, candidate_id)?;

        let mut next = profile.clone();
        next.version += 1;
        if let Some(candidate) = next.ledger.candidates.get_mut(candidate_id) {
            candidate.status = CandidateStatus::Rejected;
            candidate.resolved_in = Some(next.version);
        }

        let profile = self.commit(next).await?;
        tracing::info!(version = profile.version, candidate = candidate_id, "candidate rejected");
        Ok(profile)
    }

    /// Switch a rule that feedback deactivated back on.
    pub async fn reactivate_rule(
        &self,
        profile: &StyleProfile,
        rule_id: &RuleId,
    ) -> Result<Arc<StyleProfile>> {
        let _guard = self.commit.lock().await;
        self.ensure_current(profile)?;

        if !profile.declares_rule(rule_id) {
            return Err(ValidationError::UnknownRule {
                id: rule_id.to_string(),
            }
            .into());
        }
        if profile.is_rule_active(rule_id) || rule_id.kind() == RuleKind::Structure {
            return Err(ValidationError::InvalidRule {
                rule: rule_id.to_string(),
                reason: "rule is already active".into(),
            }
            .into());
        }

        let mut next = profile.clone();
        next.version += 1;
        let floor = self.config.initial_confidence;
        let state = next
            .rules
            .entry(rule_id.clone())
            .or_insert_with(|| RuleState::new(floor));
        state.active = true;
        state.deactivated_in = None;
        state.penalties = 0;
        state.confidence = state.confidence.max(floor);

        let profile = self.commit(next).await?;
        tracing::info!(version = profile.version, rule = rule_id.as_str(), "rule reactivated");
        Ok(profile)
    }

    fn ensure_current(&self, profile: &StyleProfile) -> Result<()> {
        let current = self.handle.version();
        if profile.version != current {
            return Err(ConcurrencyError::ProfileVersionMismatch {
                supplied: profile.version,
                current,
            }
            .into());
        }
        Ok(())
    }

    async fn commit(&self, next: StyleProfile) -> Result<Arc<StyleProfile>> {
        self.persistence.save_profile(&next).await?;
        self.handle.publish(next);
        Ok(self.handle.snapshot())
    }

    /// Artifacts needed to promote examples and track preferred length.
    async fn load_artifacts(
        &self,
        profile: &StyleProfile,
        events: &[FeedbackEvent],
    ) -> Result<BTreeMap<String, GeneratedArtifact>> {
        let mut artifacts = BTreeMap::new();
        for event in events {
            if event.rating < 4
                || profile.ledger.has_folded(&event.event_id, event.seq)
                || artifacts.contains_key(&event.artifact_id)
            {
                continue;
            }
            if let Some(artifact) = self.persistence.load_artifact(&event.artifact_id).await? {
                artifacts.insert(event.artifact_id.clone(), artifact);
            }
        }
        Ok(artifacts)
    }
}

fn staged_candidate<'p>(
    profile: &'p StyleProfile,
    candidate_id: &str,
) -> Result<&'p crate::style::Candidate> {
    let candidate = profile
        .ledger
        .candidates
        .get(candidate_id)
        .ok_or_else(|| ValidationError::UnknownCandidate {
            id: candidate_id.to_string(),
        })?;
    if candidate.status != CandidateStatus::Staged {
        return Err(ValidationError::CandidateNotStaged {
            id: candidate_id.to_string(),
        }
        .into());
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoiceError;
    use crate::feedback::ArtifactKind;
    use crate::persistence::SqlitePersistence;
    use crate::rules::CorrectionApplied;
    use crate::style::Category;
    use chrono::Utc;

    async fn setup() -> (LearningAdapter, FeedbackStore, Arc<dyn Persistence>) {
        let persistence: Arc<dyn Persistence> =
            Arc::new(SqlitePersistence::open_in_memory().await.unwrap());
        let seed = StyleProfile::seed();
        persistence.save_profile(&seed).await.unwrap();
        let adapter = LearningAdapter::new(
            Arc::clone(&persistence),
            ProfileHandle::new(seed),
            LearningConfig::default(),
        );
        let store = FeedbackStore::new(Arc::clone(&persistence));
        (adapter, store, persistence)
    }

    async fn artifact(persistence: &Arc<dyn Persistence>, id: &str) {
        persistence
            .append_artifact(&GeneratedArtifact {
                artifact_id: id.into(),
                category: Category::InternalCommunication,
                kind: ArtifactKind::Corrected,
                source_id: None,
                input: "Gracias a todos los empleados".into(),
                raw_text: "Gracias a todos los empleados".into(),
                final_text: "Gracias a todos los colaboradores".into(),
                corrections: vec![CorrectionApplied {
                    rule_id: RuleId::term("empleados"),
                    original_span: "empleados".into(),
                    replacement: "colaboradores".into(),
                }],
                style_profile_version: 1,
                backend: "simulator".into(),
                option_label: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pending_then_learn_bumps_version_once() {
        let (adapter, store, persistence) = setup().await;
        artifact(&persistence, "a1").await;
        store.record_feedback("a1", 5, Some("Muy bien")).await.unwrap();

        let snapshot = adapter.handle().snapshot();
        assert_eq!(adapter.pending_events(&snapshot, &store).await.unwrap().len(), 1);

        let update = adapter.learn_pending(&store).await.unwrap();
        assert_eq!(update.profile.version, 2);
        assert!(update.profile.ledger.positive_notes.contains(&"Muy bien".to_string()));

        let again = adapter.learn_pending(&store).await.unwrap();
        assert!(again.report.is_noop());
        assert_eq!(again.profile.version, 2);
        assert_eq!(persistence.load_profile().await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn learning_pass_replaces_event_ids_with_a_watermark() {
        let (adapter, store, persistence) = setup().await;
        artifact(&persistence, "a1").await;
        artifact(&persistence, "a2").await;
        let manual = store.record_feedback("a1", 4, None).await.unwrap();
        let snapshot = adapter.handle().snapshot();
        adapter.update(&snapshot, &[manual.clone()]).await.unwrap();
        assert!(adapter.handle().snapshot().ledger.processed_events.contains(&manual.event_id));

        store.record_feedback("a2", 5, None).await.unwrap();
        let update = adapter.learn_pending(&store).await.unwrap();
        assert_eq!(update.report.folded, 1);
        assert_eq!(update.profile.ledger.folded_through, Some(2));
        assert!(update.profile.ledger.processed_events.is_empty());

        let stored = persistence.load_profile().await.unwrap().unwrap();
        assert_eq!(stored.ledger.folded_through, Some(2));
        assert!(stored.ledger.processed_events.is_empty());

        let events: Vec<FeedbackEvent> = store.history(None).try_collect().await.unwrap();
        let replay = adapter.update(&update.profile, &events).await.unwrap();
        assert!(replay.report.is_noop());
        assert_eq!(replay.report.skipped, 2);
        assert!(adapter.pending_events(&update.profile, &store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_profile_is_rejected() {
        let (adapter, store, persistence) = setup().await;
        artifact(&persistence, "a1").await;
        let stale = adapter.handle().snapshot();
        let event = store.record_feedback("a1", 4, None).await.unwrap();

        adapter.update(&stale, &[event.clone()]).await.unwrap();
        let err = adapter.update(&stale, &[event]).await.unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Concurrency(ConcurrencyError::ProfileVersionMismatch {
                supplied: 1,
                current: 2
            })
        ));
    }

    #[tokio::test]
    async fn candidate_lifecycle() {
        let (adapter, store, persistence) = setup().await;
        for id in ["a1", "a2", "a3"] {
            artifact(&persistence, id).await;
            store
                .record_feedback(id, 1, Some("Cambiar 'compañía' por 'organización'"))
                .await
                .unwrap();
        }
        let update = adapter.learn_pending(&store).await.unwrap();
        assert_eq!(update.report.staged, vec!["candidate:compañía".to_string()]);
        assert_eq!(update.profile.preferred_terms["compañía"], "empresa");

        let confirmed = adapter
            .confirm_candidate(&update.profile, "candidate:compañía", None)
            .await
            .unwrap();
        assert_eq!(confirmed.version, update.profile.version + 1);
        assert_eq!(confirmed.preferred_terms["compañía"], "organización");

        let err = adapter
            .reject_candidate(&confirmed, "candidate:compañía")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::CandidateNotStaged { .. })
        ));
    }

    #[tokio::test]
    async fn candidate_naming_a_section_cannot_be_confirmed() {
        let (adapter, store, persistence) = setup().await;
        for id in ["a1", "a2", "a3"] {
            artifact(&persistence, id).await;
            store
                .record_feedback(id, 1, Some("Usar 'comunicado' en lugar de 'mensaje'"))
                .await
                .unwrap();
        }
        let update = adapter.learn_pending(&store).await.unwrap();
        assert_eq!(update.report.staged, vec!["candidate:mensaje".to_string()]);

        let err = adapter
            .confirm_candidate(&update.profile, "candidate:mensaje", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::InvalidRule { .. })
        ));
        assert_eq!(adapter.handle().version(), update.profile.version);
        assert!(!adapter.handle().snapshot().preferred_terms.contains_key("mensaje"));
    }

    #[tokio::test]
    async fn unknown_candidate_and_rule() {
        let (adapter, _, _) = setup().await;
        let profile = adapter.handle().snapshot();
        let err = adapter
            .confirm_candidate(&profile, "candidate:nada", Some("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::UnknownCandidate { .. })
        ));

        let err = adapter
            .reactivate_rule(&profile, &RuleId::term("inexistente"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::UnknownRule { .. })
        ));
        assert_eq!(adapter.handle().version(), 1);
    }

    #[tokio::test]
    async fn deactivated_rule_can_be_reactivated() {
        let (adapter, store, persistence) = setup().await;
        for id in ["a1", "a2", "a3"] {
            artifact(&persistence, id).await;
            store.record_feedback(id, 1, None).await.unwrap();
        }
        let update = adapter.learn_pending(&store).await.unwrap();
        let rule = RuleId::term("empleados");
        assert!(!update.profile.is_rule_active(&rule));

        let revived = adapter.reactivate_rule(&update.profile, &rule).await.unwrap();
        assert!(revived.is_rule_active(&rule));
        assert_eq!(revived.version, update.profile.version + 1);
        assert_eq!(revived.rules[&rule].penalties, 0);
    }
}
