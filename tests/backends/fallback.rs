use std::collections::BTreeMap;

use brandvoice::backends::build_chain;
use brandvoice::config::{BackendEntry, BackendKind};
use brandvoice::style::Category;
use brandvoice::{Config, Engine};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::engine_harness::memory_store;

const LONG_REPLY: &str = "Hoy queremos agradecer a cada colaborador por su entrega diaria.";

fn entry(kind: BackendKind, base_url: String) -> BackendEntry {
    BackendEntry {
        kind,
        enabled: true,
        api_key_env: None,
        api_key: Some("test-key".into()),
        base_url: Some(base_url),
        model: "test-model".into(),
        timeout_secs: 5,
        calls_per_minute: 0,
    }
}

/// `alpha` (OpenAI-compatible) then `beta` (Gemini), both on `server`.
fn two_backend_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.preferred_backend = None;
    config.backends.providers = BTreeMap::from([
        (
            "alpha".to_string(),
            entry(BackendKind::OpenaiCompatible, format!("{}/alpha", server.uri())),
        ),
        (
            "beta".to_string(),
            entry(BackendKind::Gemini, format!("{}/beta", server.uri())),
        ),
    ]);
    config.backends.fallback_order = vec!["alpha".into(), "beta".into()];
    config
}

async fn engine_for(config: &Config) -> Engine {
    Engine::bootstrap(config, memory_store().await, build_chain(config), None)
        .await
        .unwrap()
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

#[tokio::test]
async fn every_backend_failing_still_yields_all_sections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(2)
        .mount(&server)
        .await;

    let config = two_backend_config(&server);
    let engine = engine_for(&config).await;
    assert_eq!(
        engine.orchestrator().chain().backend_names(),
        vec!["alpha", "beta", "simulator"]
    );

    let artifact = engine
        .orchestrator()
        .generate("Día de la Mujer", Category::InternalCommunication)
        .await
        .unwrap();
    assert_eq!(artifact.backend, "simulator");
    let lower = artifact.final_text.to_lowercase();
    for section in ["reflexión", "reconocimiento", "mensaje", "inspiración"] {
        assert!(lower.contains(section), "missing {section}");
    }
}

#[tokio::test]
async fn next_backend_answers_and_missing_sections_are_stubbed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alpha/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/beta/models/test-model:generateContent"))
        .respond_with(gemini_reply(LONG_REPLY))
        .mount(&server)
        .await;

    let engine = engine_for(&two_backend_config(&server)).await;
    let artifact = engine
        .orchestrator()
        .generate("Día de la Mujer", Category::InternalCommunication)
        .await
        .unwrap();

    assert_eq!(artifact.backend, "beta");
    assert_eq!(artifact.raw_text, LONG_REPLY);
    assert!(artifact.final_text.starts_with(LONG_REPLY));
    assert!(artifact.final_text.contains("## Reflexión\n[por completar]"));
    assert!(artifact.final_text.contains("## Inspiración\n[por completar]"));
}

#[tokio::test]
async fn short_answers_count_as_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alpha/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Hola equipo." } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/beta/models/test-model:generateContent"))
        .respond_with(gemini_reply(LONG_REPLY))
        .mount(&server)
        .await;

    let engine = engine_for(&two_backend_config(&server)).await;
    let artifact = engine
        .orchestrator()
        .correct("Texto para los empleados", Category::CommercialEmail)
        .await
        .unwrap();
    assert_eq!(artifact.backend, "beta");
}

#[tokio::test]
async fn rate_limited_backend_is_skipped_during_cooldown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alpha/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/beta/models/test-model:generateContent"))
        .respond_with(gemini_reply(LONG_REPLY))
        .expect(2)
        .mount(&server)
        .await;

    let engine = engine_for(&two_backend_config(&server)).await;
    for _ in 0..2 {
        let artifact = engine
            .orchestrator()
            .correct("Saludos al personal", Category::InternalCommunication)
            .await
            .unwrap();
        assert_eq!(artifact.backend, "beta");
    }
}
