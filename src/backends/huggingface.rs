use super::http::{build_backend_client, non_empty, send_json};
use super::traits::{CompletionFuture, TextBackend};
use crate::generation::PromptContext;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Hosted inference backend. The prompt is sent as one plain input.
pub struct HuggingFaceBackend {
    name: String,
    endpoint: String,
    cached_auth: String,
    client: Client,
}

impl HuggingFaceBackend {
    pub fn new(
        name: &str,
        base_url: Option<&str>,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_HUGGINGFACE_BASE_URL)
            .trim_end_matches('/');
        Self {
            name: name.to_string(),
            endpoint: format!("{base_url}/models/{model}"),
            cached_auth: format!("Bearer {api_key}"),
            client: build_backend_client(timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Parameters {
    max_length: usize,
    temperature: f64,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: Option<String>,
}

impl TextBackend for HuggingFaceBackend {
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
            let inputs = if context.system_prompt.is_empty() {
                instruction.to_string()
            } else {
                format!("{}\n\n{instruction}", context.system_prompt)
            };
            let body = InferenceRequest {
                inputs,
                parameters: Parameters {
                    max_length,
                    temperature: context.temperature,
                    return_full_text: false,
                },
            };
            let request = self
                .client
                .post(&self.endpoint)
                .header("Authorization", &self.cached_auth)
                .json(&body);

            let generations: Vec<Generation> = send_json(&self.name, request).await?;
            let text = generations.into_iter().find_map(|g| g.generated_text);
            non_empty(&self.name, text)
        })
    }
}
