mod backends;
mod core;
mod generation;
mod learning;
mod observability;
mod storage;

pub use backends::{BackendEntry, BackendKind, BackendsConfig};
pub use core::Config;
pub use generation::GenerationConfig;
pub use learning::LearningConfig;
pub use observability::ObservabilityConfig;
pub use storage::StorageConfig;
