use brandvoice::error::{ReferentialError, ValidationError, VoiceError};
use brandvoice::style::{Category, RuleId};

use super::engine_harness::{corrected, memory_engine, profile_without};

#[tokio::test]
async fn dia_de_la_mujer_keeps_every_section_without_backends() {
    let (engine, _) = memory_engine(None).await;
    let artifact = engine
        .orchestrator()
        .generate("Día de la Mujer", Category::InternalCommunication)
        .await
        .unwrap();

    assert_eq!(artifact.backend, "simulator");
    let lower = artifact.final_text.to_lowercase();
    for section in ["reflexión", "reconocimiento", "mensaje", "inspiración"] {
        assert!(lower.contains(section), "missing {section} in {lower}");
    }
}

#[tokio::test]
async fn empleados_becomes_colaboradores() {
    let (engine, _) = memory_engine(None).await;
    let artifact = engine
        .orchestrator()
        .correct("Gracias a todos los empleados", Category::InternalCommunication)
        .await
        .unwrap();

    assert_eq!(artifact.final_text, "Gracias a todos los colaboradores");
    assert_eq!(artifact.corrections.len(), 1);
    let correction = &artifact.corrections[0];
    assert_eq!(correction.rule_id, RuleId::term("empleados"));
    assert_eq!(correction.original_span, "empleados");
    assert_eq!(correction.replacement, "colaboradores");
}

#[tokio::test]
async fn repeated_complaints_stage_a_candidate_until_confirmed() {
    let (engine, _) = memory_engine(Some(profile_without(&["empleados"]))).await;

    for _ in 0..3 {
        let artifact = corrected(&engine, "Saludos a los empleados de la sede norte").await;
        engine
            .feedback()
            .record_feedback(
                &artifact.artifact_id,
                1,
                Some("Usar 'colaboradores' en lugar de 'empleados'"),
            )
            .await
            .unwrap();
    }

    let update = engine.learning().learn_pending(engine.feedback()).await.unwrap();
    assert_eq!(update.report.staged, vec!["candidate:empleados".to_string()]);
    assert!(!update.profile.preferred_terms.contains_key("empleados"));

    let before = update.profile.version;
    let confirmed = engine
        .learning()
        .confirm_candidate(&update.profile, "candidate:empleados", None)
        .await
        .unwrap();
    assert_eq!(confirmed.version, before + 1);
    assert_eq!(confirmed.preferred_terms["empleados"], "colaboradores");

    let artifact = corrected(&engine, "Gracias a todos los empleados").await;
    assert_eq!(artifact.final_text, "Gracias a todos los colaboradores");
    assert_eq!(artifact.style_profile_version, before + 1);
}

#[tokio::test]
async fn fabricated_artifact_is_rejected_and_store_untouched() {
    let (engine, persistence) = memory_engine(None).await;

    let err = engine
        .feedback()
        .record_feedback("no-such-artifact", 4, Some("bien"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VoiceError::Referential(ReferentialError::UnknownArtifact { ref artifact_id })
            if artifact_id == "no-such-artifact"
    ));
    assert_eq!(persistence.count_events().await.unwrap(), 0);
    assert!(engine.feedback().recent(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_rating_is_a_validation_error() {
    let (engine, persistence) = memory_engine(None).await;
    let artifact = corrected(&engine, "Hola equipo").await;

    for rating in [0, 6, -3] {
        let err = engine
            .feedback()
            .record_feedback(&artifact.artifact_id, rating, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::RatingOutOfRange { .. })
        ));
    }
    assert_eq!(persistence.count_events().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_category_names_are_refused() {
    let (engine, _) = memory_engine(None).await;
    let err = engine
        .orchestrator()
        .generate_named("Aniversario", "press_release")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VoiceError::Validation(ValidationError::UnsupportedCategory { ref value }) if value == "press_release"
    ));
}
