use brandvoice::backends::{GeminiBackend, HuggingFaceBackend, OpenAiCompatibleBackend, TextBackend};
use brandvoice::config::GenerationConfig;
use brandvoice::error::BackendError;
use brandvoice::generation::{PromptContext, PromptTemplates};
use brandvoice::rules::ApplyMode;
use brandvoice::style::{Category, StyleProfile};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPLY: &str = "Hoy celebramos a cada colaboradora de la familia Casa Limpia.";

fn prepared_context() -> (PromptContext, String) {
    let mut context = PromptContext::from_profile(
        &StyleProfile::seed(),
        Category::InternalCommunication,
        ApplyMode::Generation,
        "Día de la Mujer",
        None,
        &GenerationConfig::default(),
    );
    let instruction = PromptTemplates::new()
        .unwrap()
        .prepare(&mut context)
        .unwrap();
    (context, instruction)
}

#[tokio::test]
async fn openai_compatible_sends_bearer_and_system_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer gsk-test"))
        .and(body_partial_json(json!({ "model": "llama3-8b-8192", "max_tokens": 800 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": format!("  {REPLY}\n") } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiCompatibleBackend::new(
        "groq",
        &format!("{}/v1", server.uri()),
        Some("gsk-test"),
        "llama3-8b-8192",
        5,
    );
    let (context, instruction) = prepared_context();
    let text = backend.complete(&context, &instruction, 800).await.unwrap();
    assert_eq!(text, REPLY);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
}

#[tokio::test]
async fn openai_compatible_maps_429_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let backend = OpenAiCompatibleBackend::new("together", &server.uri(), Some("k"), "m", 5);
    let (context, instruction) = prepared_context();
    let err = backend.complete(&context, &instruction, 100).await.unwrap_err();
    assert_eq!(
        err,
        BackendError::RateLimited {
            backend: "together".into()
        }
    );
}

#[tokio::test]
async fn error_bodies_are_scrubbed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("invalid api key sk-live-abcdef123456"),
        )
        .mount(&server)
        .await;

    let backend = OpenAiCompatibleBackend::new("openai", &server.uri(), Some("k"), "m", 5);
    let (context, instruction) = prepared_context();
    let err = backend.complete(&context, &instruction, 100).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(!message.contains("abcdef123456"), "{message}");
}

#[tokio::test]
async fn gemini_passes_key_as_query_and_reads_first_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "AIza-test"))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 800, "topK": 10 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": REPLY }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(
        "gemini",
        Some(server.uri().as_str()),
        "AIza-test",
        "gemini-1.5-flash",
        5,
    );
    let (context, instruction) = prepared_context();
    let text = backend.complete(&context, &instruction, 800).await.unwrap();
    assert_eq!(text, REPLY);
}

#[tokio::test]
async fn gemini_without_candidates_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new("gemini", Some(server.uri().as_str()), "k", "gemini-1.5-flash", 5);
    let (context, instruction) = prepared_context();
    let err = backend.complete(&context, &instruction, 100).await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable { .. }));
}

#[tokio::test]
async fn huggingface_sends_single_input_and_reads_generated_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/microsoft/DialoGPT-medium"))
        .and(header("Authorization", "Bearer hf_test"))
        .and(body_partial_json(json!({
            "parameters": { "max_length": 400, "return_full_text": false }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": REPLY }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HuggingFaceBackend::new(
        "huggingface",
        Some(server.uri().as_str()),
        "hf_test",
        "microsoft/DialoGPT-medium",
        5,
    );
    let (context, instruction) = prepared_context();
    let text = backend.complete(&context, &instruction, 400).await.unwrap();
    assert_eq!(text, REPLY);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let inputs = body["inputs"].as_str().unwrap();
    assert!(inputs.contains("Casa Limpia Colombia"));
    assert!(inputs.contains("Día de la Mujer"));
}
