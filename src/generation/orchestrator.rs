use super::approach::Approach;
use super::context::PromptContext;
use super::prompt::PromptTemplates;
use crate::backends::FallbackChain;
use crate::config::GenerationConfig;
use crate::error::{ReferentialError, Result, ValidationError};
use crate::feedback::{ArtifactKind, GeneratedArtifact};
use crate::persistence::Persistence;
use crate::rules::{ApplyMode, RuleEngine};
use crate::style::{Category, ProfileHandle, StyleProfile};
use chrono::Utc;
use futures_util::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

/// One text to produce against a pinned profile.
struct Request<'r> {
    kind: ArtifactKind,
    category: Category,
    input: &'r str,
    approach: Option<Approach>,
    source_id: Option<String>,
    option_label: Option<String>,
}

/// Turns requests into persisted, rule-conformant artifacts.
///
/// Each request pins one profile snapshot, renders the prompt, walks the
/// fallback chain and runs the raw text through the [`RuleEngine`]. Backend
/// failures never reach the caller.
pub struct GenerationOrchestrator {
    handle: ProfileHandle,
    persistence: Arc<dyn Persistence>,
    chain: FallbackChain,
    templates: PromptTemplates,
    config: GenerationConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        handle: ProfileHandle,
        persistence: Arc<dyn Persistence>,
        chain: FallbackChain,
        config: GenerationConfig,
    ) -> Result<Self> {
        Ok(Self {
            handle,
            persistence,
            chain,
            templates: PromptTemplates::new()?,
            config,
        })
    }

    #[must_use]
    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    pub async fn generate(&self, instruction: &str, category: Category) -> Result<GeneratedArtifact> {
        let instruction = non_blank(instruction, "instruction")?;
        let profile = self.handle.snapshot();
        self.produce(
            &profile,
            Request {
                kind: ArtifactKind::Generated,
                category,
                input: instruction,
                approach: Some(Approach::suggest(instruction)),
                source_id: None,
                option_label: None,
            },
        )
        .await
    }

    pub async fn generate_named(&self, instruction: &str, category: &str) -> Result<GeneratedArtifact> {
        let category: Category = category.parse()?;
        self.generate(instruction, category).await
    }

    /// `n` variants, one creative approach each, all from the same snapshot.
    ///
    /// `n` is clamped to the number of approaches so every variant differs.
    pub async fn generate_options(
        &self,
        instruction: &str,
        category: Category,
        n: usize,
    ) -> Result<Vec<GeneratedArtifact>> {
        let instruction = non_blank(instruction, "instruction")?;
        let variants = n.clamp(1, Approach::count());
        if variants != n {
            tracing::debug!(requested = n, variants, "option count clamped");
        }
        let profile = self.handle.snapshot();
        let requests = Approach::rotation(variants).into_iter().map(|approach| {
            self.produce(
                &profile,
                Request {
                    kind: ArtifactKind::Generated,
                    category,
                    input: instruction,
                    approach: Some(approach),
                    source_id: None,
                    option_label: Some(approach.label().to_string()),
                },
            )
        });
        try_join_all(requests).await
    }

    pub async fn correct(&self, source_text: &str, category: Category) -> Result<GeneratedArtifact> {
        let source_text = non_blank(source_text, "source_text")?;
        let profile = self.handle.snapshot();
        self.produce(
            &profile,
            Request {
                kind: ArtifactKind::Corrected,
                category,
                input: source_text,
                approach: None,
                source_id: None,
                option_label: None,
            },
        )
        .await
    }

    pub async fn correct_named(&self, source_text: &str, category: &str) -> Result<GeneratedArtifact> {
        let category: Category = category.parse()?;
        self.correct(source_text, category).await
    }

    /// Re-correct a stored artifact's final text; the result links back to it.
    pub async fn correct_artifact(&self, source_id: &str) -> Result<GeneratedArtifact> {
        let source = self
            .persistence
            .load_artifact(source_id)
            .await?
            .ok_or_else(|| ReferentialError::UnknownArtifact {
                artifact_id: source_id.to_string(),
            })?;
        let profile = self.handle.snapshot();
        self.produce(
            &profile,
            Request {
                kind: ArtifactKind::Corrected,
                category: source.category,
                input: &source.final_text,
                approach: None,
                source_id: Some(source.artifact_id.clone()),
                option_label: None,
            },
        )
        .await
    }

    async fn produce(&self, profile: &StyleProfile, request: Request<'_>) -> Result<GeneratedArtifact> {
        let (mode, max_length) = match request.kind {
            ArtifactKind::Generated => (ApplyMode::Generation, self.config.generate_max_tokens),
            ArtifactKind::Corrected => (ApplyMode::Correction, self.config.correct_max_tokens),
        };

        let mut context = PromptContext::from_profile(
            profile,
            request.category,
            mode,
            request.input,
            request.approach,
            &self.config,
        );
        let instruction = self.templates.prepare(&mut context)?;
        let completion = self.chain.complete(&context, &instruction, max_length).await;

        let outcome = RuleEngine::new(profile)
            .with_placeholder(self.config.placeholder.as_str())
            .apply(&completion.text, request.category, mode);

        let artifact = GeneratedArtifact {
            artifact_id: Uuid::new_v4().to_string(),
            category: request.category,
            kind: request.kind,
            source_id: request.source_id,
            input: request.input.trim().to_string(),
            raw_text: completion.text,
            final_text: outcome.text,
            corrections: outcome.corrections,
            style_profile_version: profile.version,
            backend: completion.backend,
            option_label: request.option_label,
            created_at: Utc::now(),
        };
        self.persistence.append_artifact(&artifact).await?;

        tracing::info!(
            artifact_id = artifact.artifact_id.as_str(),
            category = %artifact.category,
            kind = %artifact.kind,
            backend = artifact.backend.as_str(),
            version = artifact.style_profile_version,
            corrections = artifact.corrections.len(),
            "artifact produced"
        );
        Ok(artifact)
    }
}

fn non_blank<'a>(text: &'a str, field: &'static str) -> std::result::Result<&'a str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInstruction { field });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoiceError;
    use crate::persistence::SqlitePersistence;

    async fn orchestrator() -> (GenerationOrchestrator, Arc<dyn Persistence>) {
        let persistence: Arc<dyn Persistence> =
            Arc::new(SqlitePersistence::open_in_memory().await.unwrap());
        let orchestrator = GenerationOrchestrator::new(
            ProfileHandle::new(StyleProfile::seed()),
            Arc::clone(&persistence),
            FallbackChain::new(20),
            GenerationConfig::default(),
        )
        .unwrap();
        (orchestrator, persistence)
    }

    #[tokio::test]
    async fn generation_is_persisted_with_every_section() {
        let (orchestrator, persistence) = orchestrator().await;
        let artifact = orchestrator
            .generate("Día de la Mujer", Category::InternalCommunication)
            .await
            .unwrap();

        assert_eq!(artifact.backend, "simulator");
        assert_eq!(artifact.style_profile_version, 1);
        let lower = artifact.final_text.to_lowercase();
        for section in ["reflexión", "reconocimiento", "mensaje", "inspiración"] {
            assert!(lower.contains(section), "missing {section}");
        }
        let stored = persistence
            .load_artifact(&artifact.artifact_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.final_text, artifact.final_text);
        assert_eq!(stored.corrections, artifact.corrections);
    }

    #[tokio::test]
    async fn correction_rewrites_terms_only() {
        let (orchestrator, _) = orchestrator().await;
        let artifact = orchestrator
            .correct_named("Gracias a todos los empleados", "commercial_email")
            .await
            .unwrap();
        assert_eq!(artifact.final_text, "Gracias a todos los colaboradores");
        assert_eq!(artifact.corrections.len(), 1);
        assert_eq!(artifact.kind, ArtifactKind::Corrected);
    }

    #[tokio::test]
    async fn blank_input_names_the_field() {
        let (orchestrator, _) = orchestrator().await;
        let err = orchestrator
            .correct("   ", Category::Recognition)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::EmptyInstruction { field: "source_text" })
        ));
        let err = orchestrator
            .generate_named("hola", "newsletter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Validation(ValidationError::UnsupportedCategory { .. })
        ));
    }

    #[tokio::test]
    async fn options_carry_distinct_labels() {
        let (orchestrator, _) = orchestrator().await;
        let options = orchestrator
            .generate_options("Día del Operario", Category::Recognition, 3)
            .await
            .unwrap();
        let labels: Vec<_> = options
            .iter()
            .map(|a| a.option_label.as_deref().unwrap())
            .collect();
        assert_eq!(labels, vec!["Profesional", "Emotiva", "Cercana"]);
    }

    #[tokio::test]
    async fn option_count_is_capped_at_distinct_approaches() {
        let (orchestrator, persistence) = orchestrator().await;
        let options = orchestrator
            .generate_options("Día del Operario", Category::Recognition, 500)
            .await
            .unwrap();
        assert_eq!(options.len(), Approach::count());
        let labels: std::collections::BTreeSet<_> = options
            .iter()
            .map(|a| a.option_label.clone().unwrap())
            .collect();
        assert_eq!(labels.len(), options.len());
        for option in &options {
            assert!(persistence.load_artifact(&option.artifact_id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn correcting_an_artifact_links_the_source() {
        let (orchestrator, _) = orchestrator().await;
        let first = orchestrator
            .correct("Saludos al personal", Category::InternalCommunication)
            .await
            .unwrap();
        let second = orchestrator.correct_artifact(&first.artifact_id).await.unwrap();
        assert_eq!(second.source_id.as_deref(), Some(first.artifact_id.as_str()));
        assert_eq!(second.input, first.final_text);

        let err = orchestrator.correct_artifact("missing").await.unwrap_err();
        assert!(matches!(err, VoiceError::Referential(_)));
    }
}
