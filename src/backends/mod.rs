pub mod chain;
pub mod factory;
pub mod gemini;
mod http;
pub mod huggingface;
pub mod limiter;
pub mod openai_compat;
pub mod scrub;
pub mod simulator;
pub mod traits;

pub use chain::{Completion, FallbackChain};
pub use factory::{build_backend, build_chain};
pub use gemini::GeminiBackend;
pub use huggingface::HuggingFaceBackend;
pub use limiter::RateLimiter;
pub use openai_compat::OpenAiCompatibleBackend;
pub use simulator::{SIMULATOR_NAME, SimulatorBackend};
pub use traits::{CompletionFuture, TextBackend};
