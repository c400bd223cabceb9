use std::sync::Arc;

use brandvoice::Engine;
use brandvoice::Config;
use brandvoice::backends::FallbackChain;
use brandvoice::error::{ConcurrencyError, VoiceError};
use brandvoice::style::RuleId;

use super::engine_harness::{MIN_RESPONSE_CHARS, corrected, memory_engine, memory_store};

#[tokio::test]
async fn replaying_folded_events_changes_nothing() {
    let (engine, _) = memory_engine(None).await;
    let artifact = corrected(&engine, "Gracias a todos los empleados").await;
    engine
        .feedback()
        .record_feedback(&artifact.artifact_id, 5, Some("Muy cercano"))
        .await
        .unwrap();

    let first = engine.learning().learn_pending(engine.feedback()).await.unwrap();
    assert_eq!(first.profile.version, 2);
    assert_eq!(first.report.folded, 1);

    let events = engine.feedback().recent(None, 10).await.unwrap();
    let replay = engine
        .learning()
        .update(&first.profile, &events)
        .await
        .unwrap();
    assert!(replay.report.is_noop());
    assert_eq!(replay.report.skipped, 1);
    assert_eq!(*replay.profile, *first.profile);

    let again = engine.learning().learn_pending(engine.feedback()).await.unwrap();
    assert_eq!(again.profile.version, 2);
}

#[tokio::test]
async fn stale_profile_is_rejected_with_both_versions() {
    let (engine, _) = memory_engine(None).await;
    let stale = engine.profile();

    let artifact = corrected(&engine, "Hola al personal").await;
    let event = engine
        .feedback()
        .record_feedback(&artifact.artifact_id, 4, None)
        .await
        .unwrap();
    engine.learning().learn_pending(engine.feedback()).await.unwrap();

    let err = engine
        .learning()
        .update(&stale, std::slice::from_ref(&event))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VoiceError::Concurrency(ConcurrencyError::ProfileVersionMismatch {
            supplied: 1,
            current: 2
        })
    ));
    assert_eq!(engine.handle().version(), 2);
}

#[tokio::test]
async fn racing_writers_on_one_store_cannot_both_commit() {
    let persistence = memory_store().await;
    let config = Config::default();
    let first = Engine::bootstrap(
        &config,
        Arc::clone(&persistence),
        FallbackChain::new(MIN_RESPONSE_CHARS),
        None,
    )
    .await
    .unwrap();
    let second = Engine::bootstrap(
        &config,
        Arc::clone(&persistence),
        FallbackChain::new(MIN_RESPONSE_CHARS),
        None,
    )
    .await
    .unwrap();

    let artifact = corrected(&first, "Hola al personal").await;
    first
        .feedback()
        .record_feedback(&artifact.artifact_id, 5, None)
        .await
        .unwrap();

    first.learning().learn_pending(first.feedback()).await.unwrap();
    let err = second
        .learning()
        .learn_pending(second.feedback())
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::Concurrency(_)));
    assert_eq!(second.handle().version(), 1);
    assert_eq!(persistence.load_profile().await.unwrap().unwrap().version, 2);
}

#[tokio::test]
async fn later_rating_supersedes_earlier_outcome() {
    let (engine, _) = memory_engine(None).await;
    let artifact = corrected(&engine, "Hola al personal").await;
    let rule = RuleId::term("personal");

    engine
        .feedback()
        .record_feedback(&artifact.artifact_id, 5, None)
        .await
        .unwrap();
    let praised = engine.learning().learn_pending(engine.feedback()).await.unwrap();
    let praised_confidence = praised.profile.rules[&rule].confidence;
    assert!(praised_confidence > 0.5);

    engine
        .feedback()
        .record_feedback(&artifact.artifact_id, 1, None)
        .await
        .unwrap();
    let panned = engine.learning().learn_pending(engine.feedback()).await.unwrap();
    assert_eq!(panned.report.reverted, 1);
    let state = &panned.profile.rules[&rule];
    assert!(state.confidence < 0.5);
    assert_eq!(state.reinforcements, 0);
    assert_eq!(state.penalties, 1);
    assert_eq!(panned.profile.version, 3);
}
