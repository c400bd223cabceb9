use super::limiter::RateLimiter;
use super::simulator::{SIMULATOR_NAME, SimulatorBackend};
use super::traits::TextBackend;
use crate::error::BackendError;
use crate::generation::PromptContext;
use std::sync::Arc;
use std::time::Duration;

/// Raw text plus the backend that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub backend: String,
}

struct ChainLink {
    backend: Arc<dyn TextBackend>,
    timeout: Duration,
    limiter: RateLimiter,
}

/// Ordered list of backends tried in turn, terminated by the simulator.
///
/// A backend is skipped when saturated or cooling down. A call fails when it
/// errors, exceeds its timeout, or returns `min_response_chars` characters or
/// fewer. Failures are logged and the next link is tried; the simulator
/// always answers.
pub struct FallbackChain {
    links: Vec<ChainLink>,
    simulator: SimulatorBackend,
    min_response_chars: usize,
}

impl FallbackChain {
    pub fn new(min_response_chars: usize) -> Self {
        Self {
            links: Vec::new(),
            simulator: SimulatorBackend,
            min_response_chars,
        }
    }

    /// Append a backend after the ones already present.
    #[must_use]
    pub fn with_backend(
        mut self,
        backend: Arc<dyn TextBackend>,
        timeout: Duration,
        limiter: RateLimiter,
    ) -> Self {
        self.links.push(ChainLink {
            backend,
            timeout,
            limiter,
        });
        self
    }

    /// Backend names in the order they are tried.
    pub fn backend_names(&self) -> Vec<&str> {
        self.links
            .iter()
            .map(|link| link.backend.name())
            .chain(std::iter::once(SIMULATOR_NAME))
            .collect()
    }

    pub async fn complete(
        &self,
        context: &PromptContext,
        instruction: &str,
        max_length: usize,
    ) -> Completion {
        for link in &self.links {
            let name = link.backend.name();
            if !link.limiter.try_acquire() {
                tracing::warn!(backend = name, "backend saturated or cooling down; skipping");
                continue;
            }

            match self.attempt(link, context, instruction, max_length).await {
                Ok(text) => {
                    tracing::debug!(backend = name, chars = text.chars().count(), "completion accepted");
                    return Completion {
                        text,
                        backend: name.to_string(),
                    };
                }
                Err(err) => {
                    if matches!(err, BackendError::RateLimited { .. }) {
                        link.limiter.cool_down();
                    }
                    tracing::warn!(backend = name, error = %err, "backend failed; trying next");
                }
            }
        }

        Completion {
            text: self.simulator.render(context),
            backend: SIMULATOR_NAME.to_string(),
        }
    }

    async fn attempt(
        &self,
        link: &ChainLink,
        context: &PromptContext,
        instruction: &str,
        max_length: usize,
    ) -> Result<String, BackendError> {
        let name = link.backend.name();
        let text = tokio::time::timeout(
            link.timeout,
            link.backend.complete(context, instruction, max_length),
        )
        .await
        .map_err(|_| BackendError::Timeout {
            backend: name.to_string(),
            timeout_ms: u64::try_from(link.timeout.as_millis()).unwrap_or(u64::MAX),
        })??;

        let chars = text.trim().chars().count();
        if chars <= self.min_response_chars {
            return Err(BackendError::unavailable(
                name,
                format!("response too short ({chars} chars)"),
            ));
        }
        Ok(text)
    }
}
