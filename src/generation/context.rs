use super::approach::Approach;
use crate::config::GenerationConfig;
use crate::rules::ApplyMode;
use crate::style::{Category, RuleId, StyleProfile};
use serde::Serialize;

const EXAMPLE_PREVIEW_CHARS: usize = 600;

/// Discouraged -> preferred pair as shown to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermHint {
    pub avoid: String,
    pub prefer: String,
}

/// Everything a backend may use to write one text.
///
/// Built from a pinned profile snapshot; `system_prompt` is the rendered
/// form of the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub category: Category,
    pub mode: ApplyMode,
    /// The reviewer's instruction, or the text to correct.
    pub subject: String,
    pub company_name: String,
    pub mission: String,
    pub values: Vec<String>,
    pub tone: Vec<String>,
    pub vocabulary: Vec<String>,
    pub terms: Vec<TermHint>,
    pub banned_phrases: Vec<String>,
    pub sections: Vec<String>,
    pub examples: Vec<String>,
    pub notes: Vec<String>,
    pub word_range: String,
    pub approach: Option<Approach>,
    pub temperature: f64,
    pub system_prompt: String,
}

impl PromptContext {
    pub fn from_profile(
        profile: &StyleProfile,
        category: Category,
        mode: ApplyMode,
        subject: &str,
        approach: Option<Approach>,
        config: &GenerationConfig,
    ) -> Self {
        let mut vocabulary = profile.preferred_vocabulary.clone();
        if let Some(approach) = approach {
            vocabulary.extend(approach.vocabulary().iter().map(|w| (*w).to_string()));
        }

        let terms = profile
            .preferred_terms
            .iter()
            .filter(|(key, _)| profile.is_rule_active(&RuleId::term(key)))
            .map(|(avoid, prefer)| TermHint {
                avoid: avoid.clone(),
                prefer: prefer.clone(),
            })
            .collect();

        let banned_phrases = profile
            .banned_phrases
            .iter()
            .filter(|phrase| profile.is_rule_active(&RuleId::banned(phrase)))
            .cloned()
            .collect();

        let examples = profile
            .examples_for(category)
            .take(config.max_examples)
            .map(|example| preview(&example.text))
            .collect();

        let notes = profile
            .ledger
            .positive_notes
            .iter()
            .rev()
            .take(config.max_notes)
            .cloned()
            .collect();

        let word_range = approach.map_or_else(
            || profile.ledger.preferred_length.word_range().to_string(),
            |a| a.word_range().to_string(),
        );

        let temperature = match mode {
            ApplyMode::Generation => approach.map_or(config.generate_temperature, Approach::temperature),
            ApplyMode::Correction => config.correct_temperature,
        };

        Self {
            category,
            mode,
            subject: subject.trim().to_string(),
            company_name: profile.company_name.clone(),
            mission: profile.mission.clone(),
            values: profile.values.iter().cloned().collect(),
            tone: profile.tone_descriptors.clone(),
            vocabulary,
            terms,
            banned_phrases,
            sections: profile.sections(category).to_vec(),
            examples,
            notes,
            word_range,
            approach,
            temperature,
            system_prompt: String::new(),
        }
    }
}

fn preview(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(EXAMPLE_PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
