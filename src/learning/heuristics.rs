use crate::style::normalize_term;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A terminology change suggested by a reviewer comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermProposal {
    /// Normalized term the reviewer wants gone.
    pub discouraged: String,
    /// Normalized replacement, when the comment names one.
    pub preferred: Option<String>,
}

const QUOTED: &str = r#"["'“«]([^"'”»]{1,60})["'”»]"#;
const ARTICLE: &str = r"(?:(?:el|la|los|las|un|una|the|an|a)\s+)?";
const WORD: &str = r"(\p{L}[\p{L}\-]*)";
const PHRASE: &str = r"(\p{L}+(?:\s+\p{L}+){0,3}?)";

enum Shape {
    /// Replacement named before the discouraged term.
    PreferredFirst,
    /// Discouraged term named before the replacement.
    DiscouragedFirst,
    /// Discouraged term only.
    AvoidOnly,
}

struct Pattern {
    shape: Shape,
    regex: Regex,
}

fn term(slot: &str) -> String {
    format!("(?:{QUOTED}|{ARTICLE}{slot})")
}

fn compile(shape: Shape, source: &str) -> Pattern {
    let regex = Regex::new(source).expect("comment heuristic pattern is valid");
    Pattern { shape, regex }
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        compile(
            Shape::PreferredFirst,
            &format!(
                r"(?i)\b(?:usar|usa|usen|utilizar|utiliza|decir|di|prefiero|use|say|prefer)\s+{}\s+(?:en\s+lugar\s+de|en\s+vez\s+de|instead\s+of|rather\s+than)\s+{}",
                term(PHRASE),
                term(WORD)
            ),
        ),
        compile(
            Shape::DiscouragedFirst,
            &format!(
                r"(?i)\b(?:cambiar|cambia|cambien|reemplazar|reemplaza|sustituir|sustituye|replace|change|swap)\s+{}\s+(?:por|con|with|for|to)\s+{}",
                term(PHRASE),
                term(WORD)
            ),
        ),
        compile(
            Shape::AvoidOnly,
            &format!(
                r"(?i)\b(?:evitar|evita|eviten|no\s+usar|no\s+uses|no\s+utilizar|avoid|don'?t\s+use|do\s+not\s+use)\s+(?:(?:el\s+término|la\s+palabra|la\s+expresión|the\s+word|the\s+term|the\s+phrase)\s+)?{}",
                term(WORD)
            ),
        ),
    ]
});

/// First captured slot of the term group that starts at `index`.
fn slot(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index)
        .or_else(|| caps.get(index + 1))
        .map(|m| normalize_term(m.as_str()))
        .filter(|t| !t.is_empty())
}

/// Scan a reviewer comment for terminology proposals.
///
/// Recognizes "usar X en lugar de Y", "cambiar X por Y", "evitar X" and the
/// English equivalents. Quoted terms may span several words. The result is
/// deduplicated by discouraged term, keeping the first proposal that names
/// a replacement.
pub fn extract_proposals(comment: &str) -> Vec<TermProposal> {
    let mut found: Vec<(usize, TermProposal)> = Vec::new();

    for pattern in PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(comment) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let proposal = match pattern.shape {
                Shape::PreferredFirst => slot(&caps, 3).map(|discouraged| TermProposal {
                    discouraged,
                    preferred: slot(&caps, 1),
                }),
                Shape::DiscouragedFirst => slot(&caps, 1).map(|discouraged| TermProposal {
                    discouraged,
                    preferred: slot(&caps, 3),
                }),
                Shape::AvoidOnly => slot(&caps, 1).map(|discouraged| TermProposal {
                    discouraged,
                    preferred: None,
                }),
            };
            if let Some(proposal) = proposal
                && proposal.preferred.as_ref() != Some(&proposal.discouraged)
            {
                found.push((start, proposal));
            }
        }
    }

    found.sort_by_key(|(start, _)| *start);
    let mut proposals: Vec<TermProposal> = Vec::new();
    for (_, proposal) in found {
        match proposals
            .iter_mut()
            .find(|p| p.discouraged == proposal.discouraged)
        {
            Some(existing) => {
                if existing.preferred.is_none() {
                    existing.preferred = proposal.preferred;
                }
            }
            None => proposals.push(proposal),
        }
    }
    proposals
}
