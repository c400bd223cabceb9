pub mod schema;

pub use schema::{
    BackendEntry, BackendKind, BackendsConfig, Config, GenerationConfig, LearningConfig,
    ObservabilityConfig, StorageConfig,
};
