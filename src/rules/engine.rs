use super::casing::CasePattern;
use super::matcher::PhraseMatcher;
use super::structure;
use crate::error::ValidationError;
use crate::style::{Category, RuleId, StyleProfile};
use serde::{Deserialize, Serialize};

/// Upper bound on substitution passes while the text keeps changing.
const MAX_SETTLE_PASSES: usize = 4;

pub const DEFAULT_PLACEHOLDER: &str = "[por completar]";

/// One rewrite made by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionApplied {
    pub rule_id: RuleId,
    pub original_span: String,
    /// Empty when a banned phrase was removed and needs manual review.
    pub replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Fresh text: structural sections are enforced.
    Generation,
    /// User-supplied draft: wording only.
    Correction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub text: String,
    pub corrections: Vec<CorrectionApplied>,
}

/// Deterministic rewriter built from one profile snapshot.
pub struct RuleEngine<'p> {
    profile: &'p StyleProfile,
    /// Active `(key, preferred)` pairs, index-aligned with `terms`.
    term_entries: Vec<(&'p str, &'p str)>,
    terms: PhraseMatcher,
    banned_entries: Vec<&'p str>,
    banned: PhraseMatcher,
    placeholder: String,
}

impl<'p> RuleEngine<'p> {
    pub fn new(profile: &'p StyleProfile) -> Self {
        let term_entries: Vec<(&str, &str)> = profile
            .preferred_terms
            .iter()
            .filter(|(key, _)| profile.is_rule_active(&RuleId::term(key)))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let banned_entries: Vec<&str> = profile
            .banned_phrases
            .iter()
            .filter(|phrase| profile.is_rule_active(&RuleId::banned(phrase)))
            .map(String::as_str)
            .collect();

        Self {
            profile,
            terms: PhraseMatcher::new(term_entries.iter().map(|(key, _)| *key)),
            term_entries,
            banned: PhraseMatcher::new(banned_entries.iter().copied()),
            banned_entries,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn profile_version(&self) -> u64 {
        self.profile.version
    }

    /// Rewrite `text` for `category`.
    ///
    /// Banned phrases go first, then terminology; the pair repeats until the
    /// text settles. Structure is only enforced in [`ApplyMode::Generation`].
    pub fn apply(&self, text: &str, category: Category, mode: ApplyMode) -> RuleOutcome {
        let mut corrections = Vec::new();
        let mut current = text.to_string();

        for _ in 0..MAX_SETTLE_PASSES {
            let after_banned = self.scrub_banned(&current, &mut corrections);
            let after_terms = self.substitute_terms(&after_banned, &mut corrections);
            let settled = after_terms == current;
            current = after_terms;
            if settled {
                break;
            }
        }

        if mode == ApplyMode::Generation {
            current = structure::complete(
                &current,
                category,
                self.profile.sections(category),
                &self.placeholder,
                &mut corrections,
            );
        }

        RuleOutcome {
            text: current,
            corrections,
        }
    }

    /// Same as [`RuleEngine::apply`] for a category given by name.
    pub fn apply_named(
        &self,
        text: &str,
        category: &str,
        mode: ApplyMode,
    ) -> Result<RuleOutcome, ValidationError> {
        let category: Category = category.parse()?;
        Ok(self.apply(text, category, mode))
    }

    fn substitute_terms(&self, text: &str, corrections: &mut Vec<CorrectionApplied>) -> String {
        let matches = self.terms.find_all(text);
        if matches.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for m in matches {
            let (key, preferred) = self.term_entries[m.phrase];
            let span = &text[m.start..m.end];
            let replacement = CasePattern::detect(span).apply(preferred);
            out.push_str(&text[cursor..m.start]);
            out.push_str(&replacement);
            corrections.push(CorrectionApplied {
                rule_id: RuleId::term(key),
                original_span: span.to_string(),
                replacement,
            });
            cursor = m.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    fn scrub_banned(&self, text: &str, corrections: &mut Vec<CorrectionApplied>) -> String {
        let matches = self.banned.find_all(text);
        if matches.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for m in matches {
            let phrase = self.banned_entries[m.phrase];
            let span = &text[m.start..m.end];
            out.push_str(&text[cursor..m.start]);
            cursor = m.end;

            let replacement = match self.profile.safe_substitutes.get(phrase) {
                Some(substitute) => {
                    let replacement = CasePattern::detect(span).apply(substitute);
                    out.push_str(&replacement);
                    replacement
                }
                None => {
                    cursor += close_gap(&mut out, &text[cursor..]);
                    String::new()
                }
            };
            corrections.push(CorrectionApplied {
                rule_id: RuleId::banned(phrase),
                original_span: span.to_string(),
                replacement,
            });
        }
        out.push_str(&text[cursor..]);
        out
    }
}

/// Tidy the seam left by a removed phrase. Returns how many bytes of
/// `rest` were consumed.
fn close_gap(out: &mut String, rest: &str) -> usize {
    let kept = out.trim_end_matches([' ', '\t']).len();
    out.truncate(kept);
    let mut trimmed = rest.trim_start_matches([' ', '\t']);
    let dangling = out.is_empty() || out.ends_with(['\n', ',', ';', ':', '(']);
    if dangling && let Some(after) = trimmed.strip_prefix([',', ';']) {
        trimmed = after.trim_start_matches([' ', '\t']);
    }
    if trimmed.starts_with(['.', '!', '?']) && out.ends_with([',', ';']) {
        out.pop();
    }
    let consumed = rest.len() - trimmed.len();

    let joins_words = !out.is_empty()
        && !out.ends_with(['\n', '('])
        && trimmed
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | ')'));
    if joins_words {
        out.push(' ');
    }
    consumed
}
