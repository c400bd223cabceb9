//! Backend for any service speaking the OpenAI chat completions dialect
//! (Groq, Together, Cohere's compatibility API, OpenAI itself).

use super::http::{build_backend_client, non_empty, send_json};
use super::traits::{CompletionFuture, TextBackend};
use crate::generation::PromptContext;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAiCompatibleBackend {
    name: String,
    model: String,
    chat_url: String,
    /// Pre-computed `Authorization` header value.
    cached_auth: Option<String>,
    client: Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        name: &str,
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };
        Self {
            name: name.to_string(),
            model: model.to_string(),
            chat_url,
            cached_auth: api_key.map(|key| format!("Bearer {key}")),
            client: build_backend_client(timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl TextBackend for OpenAiCompatibleBackend {
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
            let mut messages = Vec::with_capacity(2);
            if !context.system_prompt.is_empty() {
                messages.push(Message {
                    role: "system",
                    content: &context.system_prompt,
                });
            }
            messages.push(Message {
                role: "user",
                content: instruction,
            });

            let body = ChatRequest {
                model: &self.model,
                messages,
                temperature: context.temperature,
                max_tokens: max_length,
            };

            let mut request = self.client.post(&self.chat_url).json(&body);
            if let Some(auth) = &self.cached_auth {
                request = request.header("Authorization", auth);
            }

            let response: ChatResponse = send_json(&self.name, request).await?;
            let text = response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content);
            non_empty(&self.name, text)
        })
    }
}
