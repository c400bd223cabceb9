use brandvoice::Engine;
use brandvoice::style::Category;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

use super::engine_harness::simulator_config;

#[tokio::test]
async fn state_survives_a_reopen() {
    let tmp = TempDir::new().unwrap();
    let config = simulator_config(tmp.path());

    let artifact_id = {
        let engine = Engine::open(&config).await.unwrap();
        let artifact = engine
            .orchestrator()
            .generate("Día del Operario", Category::Recognition)
            .await
            .unwrap();
        engine
            .feedback()
            .record_feedback(&artifact.artifact_id, 5, Some("Excelente cierre"))
            .await
            .unwrap();
        let update = engine.learning().learn_pending(engine.feedback()).await.unwrap();
        assert_eq!(update.profile.version, 2);
        artifact.artifact_id
    };

    let reopened = Engine::open(&config).await.unwrap();
    let profile = reopened.profile();
    assert_eq!(profile.version, 2);
    assert_eq!(profile.ledger.positive_notes, vec!["Excelente cierre".to_string()]);
    assert!(
        profile
            .example_texts
            .iter()
            .any(|e| e.source_artifact.as_deref() == Some(artifact_id.as_str()))
    );

    let stored = reopened
        .persistence()
        .load_artifact(&artifact_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.category, Category::Recognition);

    let history = reopened.feedback().recent(None, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].rating, 5);

    let versions = reopened.persistence().profile_versions().await.unwrap();
    let numbers: Vec<u64> = versions.iter().map(|(v, _)| *v).collect();
    assert_eq!(numbers, vec![2, 1]);
}

#[tokio::test]
async fn corrupt_profile_halts_startup() {
    let tmp = TempDir::new().unwrap();
    let config = simulator_config(tmp.path());
    drop(Engine::open(&config).await.unwrap());

    let url = format!("sqlite://{}?mode=rwc", config.database_path().display());
    let pool = SqlitePoolOptions::new().max_connections(1).connect(&url).await.unwrap();
    sqlx::query("INSERT INTO style_profiles (version, profile_json, saved_at) VALUES (2, '{not json', '2024-03-08T00:00:00Z')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let err = Engine::open(&config).await.err().unwrap();
    assert!(err.is_fatal(), "expected fatal error, got {err}");
}
