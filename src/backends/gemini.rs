use super::http::{build_backend_client, non_empty, send_json};
use super::traits::{CompletionFuture, TextBackend};
use crate::generation::PromptContext;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_OUTPUT_TOKENS: usize = 8000;

/// Google `generateContent` backend. The key travels as the `key` query
/// parameter.
pub struct GeminiBackend {
    name: String,
    endpoint: String,
    api_key: String,
    client: Client,
}

impl GeminiBackend {
    pub fn new(
        name: &str,
        base_url: Option<&str>,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/');
        Self {
            name: name.to_string(),
            endpoint: format!("{base_url}/models/{model}:generateContent"),
            api_key: api_key.to_string(),
            client: build_backend_client(timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: usize,
    top_p: f64,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl TextBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(
        &'a self,
        context: &'a PromptContext,
        instruction: &'a str,
        max_length: usize,
    ) -> CompletionFuture<'a> {
        Box::pin(async move {
            let system_instruction = (!context.system_prompt.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: &context.system_prompt,
                }],
            });
            let body = GenerateContentRequest {
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![Part { text: instruction }],
                }],
                system_instruction,
                generation_config: GenerationConfig {
                    temperature: context.temperature,
                    max_output_tokens: max_length.min(MAX_OUTPUT_TOKENS),
                    top_p: 0.8,
                    top_k: 10,
                },
            };

            let request = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&body);

            let response: GenerateContentResponse = send_json(&self.name, request).await?;
            let text = response
                .candidates
                .into_iter()
                .filter_map(|c| c.content)
                .flat_map(|c| c.parts)
                .find_map(|p| p.text);
            non_empty(&self.name, text)
        })
    }
}
