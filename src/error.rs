use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `brandvoice`.
///
/// Each subsystem defines its own error enum. Callers match on the variant
/// to decide recovery: validation and referential errors go back to the
/// user, backend errors are absorbed by the fallback chain, storage
/// corruption halts startup.
#[derive(Debug, Error)]
pub enum VoiceError {
    // ── Validation ───────────────────────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── Referential integrity ───────────────────────────────────────────
    #[error("reference: {0}")]
    Referential(#[from] ReferentialError),

    // ── Concurrency ─────────────────────────────────────────────────────
    #[error("concurrency: {0}")]
    Concurrency(#[from] ConcurrencyError),

    // ── Text backends ───────────────────────────────────────────────────
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    // ── Storage ─────────────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Validation errors ───────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyInstruction { field: &'static str },

    #[error("unsupported category '{value}'")]
    UnsupportedCategory { value: String },

    #[error("rating {rating} is outside 1..=5")]
    RatingOutOfRange { rating: i64 },

    #[error("rule {rule} rejected: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("unknown candidate '{id}'")]
    UnknownCandidate { id: String },

    #[error("candidate '{id}' is not staged")]
    CandidateNotStaged { id: String },

    #[error("unknown rule '{id}'")]
    UnknownRule { id: String },

    #[error("candidate '{id}' has no proposed term; pass one explicitly")]
    MissingPreferredTerm { id: String },
}

// ─── Referential errors ──────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferentialError {
    #[error("artifact '{artifact_id}' was never produced")]
    UnknownArtifact { artifact_id: String },
}

// ─── Concurrency errors ──────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConcurrencyError {
    #[error("profile version {supplied} is stale (current is {current})")]
    ProfileVersionMismatch { supplied: u64, current: u64 },
}

// ─── Backend errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend {backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    #[error("backend {backend} timed out after {timeout_ms}ms")]
    Timeout { backend: String, timeout_ms: u64 },

    #[error("backend {backend} rate-limited")]
    RateLimited { backend: String },
}

impl BackendError {
    pub fn unavailable(backend: &str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    pub fn backend(&self) -> &str {
        match self {
            Self::Unavailable { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::RateLimited { backend } => backend,
        }
    }
}

// ─── Storage errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt {what}: {message}")]
    Corrupt { what: String, message: String },

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("schema: {0}")]
    Schema(String),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, VoiceError>;

impl From<sqlx::Error> for VoiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StorageError::Database(err))
    }
}

impl From<serde_json::Error> for VoiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::Serialization(err))
    }
}

impl VoiceError {
    /// Errors that mean persisted state cannot be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Storage(StorageError::Corrupt { .. } | StorageError::Schema(_))
        )
    }
}
