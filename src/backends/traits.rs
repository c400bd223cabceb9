use crate::error::BackendError;
use crate::generation::PromptContext;
use std::future::Future;
use std::pin::Pin;

pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send + 'a>>;

/// Any provider of raw text completion.
///
/// Implementations return the text as produced; length checks, rule
/// application and fallback are the caller's concern.
pub trait TextBackend: Send + Sync {
    /// Identifier recorded on artifacts (e.g. "gemini", "simulator").
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        context: &'a PromptContext,
        instruction: &'a str,
        max_length: usize,
    ) -> CompletionFuture<'a>;
}
