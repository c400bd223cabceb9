use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire dialect spoken by a configured backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `POST {base_url}/chat/completions` with a bearer key.
    OpenaiCompatible,
    /// Google `generateContent`.
    Gemini,
    /// Hugging Face hosted inference.
    Huggingface,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendEntry {
    pub kind: BackendKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Environment variable holding the key. Checked before `api_key`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_calls_per_minute")]
    pub calls_per_minute: u32,
}

impl BackendEntry {
    fn new(kind: BackendKind, key_env: &str, base_url: Option<&str>, model: &str, cpm: u32) -> Self {
        Self {
            kind,
            enabled: true,
            api_key_env: Some(key_env.to_string()),
            api_key: None,
            base_url: base_url.map(String::from),
            model: model.to_string(),
            timeout_secs: default_timeout_secs(),
            calls_per_minute: cpm,
        }
    }

    /// Key from the environment first, then the file.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(String::from)
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendsConfig {
    /// Tried in this order after the preferred backend. The simulator
    /// always closes the chain and is not listed here.
    #[serde(default = "default_fallback_order")]
    pub fallback_order: Vec<String>,
    /// Completions at or below this many characters count as failures.
    #[serde(default = "default_min_response_chars")]
    pub min_response_chars: usize,
    /// Pause after an HTTP 429 before the backend is tried again.
    #[serde(default = "default_rate_limit_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, BackendEntry>,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_calls_per_minute() -> u32 {
    60
}

fn default_min_response_chars() -> usize {
    20
}

fn default_rate_limit_cooldown_secs() -> u64 {
    60
}

fn default_fallback_order() -> Vec<String> {
    ["gemini", "groq", "huggingface", "together", "cohere"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_providers() -> BTreeMap<String, BackendEntry> {
    use BackendKind::{Gemini, Huggingface, OpenaiCompatible};

    let mut openai = BackendEntry::new(
        OpenaiCompatible,
        "OPENAI_API_KEY",
        Some("https://api.openai.com/v1"),
        "gpt-3.5-turbo",
        60,
    );
    openai.enabled = false;

    BTreeMap::from([
        (
            "gemini".to_string(),
            BackendEntry::new(Gemini, "GEMINI_API_KEY", None, "gemini-1.5-flash", 60),
        ),
        (
            "groq".to_string(),
            BackendEntry::new(
                OpenaiCompatible,
                "GROQ_API_KEY",
                Some("https://api.groq.com/openai/v1"),
                "llama3-8b-8192",
                30,
            ),
        ),
        (
            "huggingface".to_string(),
            BackendEntry::new(
                Huggingface,
                "HUGGINGFACE_API_KEY",
                None,
                "microsoft/DialoGPT-medium",
                100,
            ),
        ),
        (
            "together".to_string(),
            BackendEntry::new(
                OpenaiCompatible,
                "TOGETHER_API_KEY",
                Some("https://api.together.xyz/v1"),
                "meta-llama/Llama-2-7b-chat-hf",
                50,
            ),
        ),
        (
            "cohere".to_string(),
            BackendEntry::new(
                OpenaiCompatible,
                "COHERE_API_KEY",
                Some("https://api.cohere.com/compatibility/v1"),
                "command-light",
                20,
            ),
        ),
        ("openai".to_string(), openai),
    ])
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            fallback_order: default_fallback_order(),
            min_response_chars: default_min_response_chars(),
            rate_limit_cooldown_secs: default_rate_limit_cooldown_secs(),
            providers: default_providers(),
        }
    }
}

impl BackendsConfig {
    /// Names in call order: `preferred` first (when configured), then
    /// `fallback_order`, without duplicates or disabled entries.
    pub fn chain_order(&self, preferred: Option<&str>) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for name in preferred.into_iter().chain(self.fallback_order.iter().map(String::as_str)) {
            let enabled = self.providers.get(name).is_some_and(|entry| entry.enabled);
            if enabled && !order.iter().any(|seen| seen == name) {
                order.push(name.to_string());
            }
        }
        order
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for name in &self.fallback_order {
            anyhow::ensure!(
                self.providers.contains_key(name),
                "backends.fallback_order names unknown backend '{name}'"
            );
        }
        for (name, entry) in &self.providers {
            anyhow::ensure!(
                !entry.model.trim().is_empty(),
                "backends.providers.{name}.model must not be empty"
            );
            anyhow::ensure!(
                entry.timeout_secs > 0,
                "backends.providers.{name}.timeout_secs must be positive"
            );
            anyhow::ensure!(
                entry.kind != BackendKind::OpenaiCompatible || entry.base_url.is_some(),
                "backends.providers.{name}.base_url is required for openai_compatible"
            );
        }
        Ok(())
    }
}
