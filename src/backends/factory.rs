use super::chain::FallbackChain;
use super::gemini::GeminiBackend;
use super::huggingface::HuggingFaceBackend;
use super::limiter::RateLimiter;
use super::openai_compat::OpenAiCompatibleBackend;
use super::simulator::SIMULATOR_NAME;
use super::traits::TextBackend;
use crate::config::{BackendEntry, BackendKind, Config};
use std::sync::Arc;
use std::time::Duration;

/// Build the fallback chain described by `config`.
///
/// Backends whose key cannot be resolved are left out. A preferred backend
/// of `"simulator"` yields a chain holding only the simulator.
pub fn build_chain(config: &Config) -> FallbackChain {
    let backends = &config.backends;
    let mut chain = FallbackChain::new(backends.min_response_chars);
    let preferred = config.preferred_backend.as_deref();
    if preferred == Some(SIMULATOR_NAME) {
        return chain;
    }

    let cooldown = Duration::from_secs(backends.rate_limit_cooldown_secs);
    for name in backends.chain_order(preferred) {
        let Some(entry) = backends.providers.get(&name) else {
            continue;
        };
        match build_backend(&name, entry) {
            Some(backend) => {
                chain = chain.with_backend(
                    backend,
                    Duration::from_secs(entry.timeout_secs),
                    RateLimiter::new(entry.calls_per_minute, cooldown),
                );
            }
            None => tracing::debug!(backend = name.as_str(), "no API key; left out of chain"),
        }
    }
    chain
}

/// One backend from its entry, or `None` when a required key is missing.
///
/// OpenAI-compatible entries with no key source at all are built keyless
/// (local servers); every other kind needs a key.
pub fn build_backend(name: &str, entry: &BackendEntry) -> Option<Arc<dyn TextBackend>> {
    let key = entry.resolve_api_key();
    let base_url = entry.base_url.as_deref();

    let backend: Arc<dyn TextBackend> = match entry.kind {
        BackendKind::OpenaiCompatible => {
            let wants_key = entry.api_key_env.is_some() || entry.api_key.is_some();
            if wants_key && key.is_none() {
                return None;
            }
            Arc::new(OpenAiCompatibleBackend::new(
                name,
                base_url?,
                key.as_deref(),
                &entry.model,
                entry.timeout_secs,
            ))
        }
        BackendKind::Gemini => Arc::new(GeminiBackend::new(
            name,
            base_url,
            &key?,
            &entry.model,
            entry.timeout_secs,
        )),
        BackendKind::Huggingface => Arc::new(HuggingFaceBackend::new(
            name,
            base_url,
            &key?,
            &entry.model,
            entry.timeout_secs,
        )),
    };
    Some(backend)
}
