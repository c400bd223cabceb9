use super::category::Category;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::Display;

/// Stable identifier of a single rule inside a profile.
///
/// Encoded as `<kind>:<target>` so it can key JSON maps and be typed on the
/// command line, e.g. `term:empleados` or `structure:recognition:logros`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RuleKind {
    Term,
    Banned,
    Structure,
}

impl RuleId {
    pub fn term(key: &str) -> Self {
        Self(format!("term:{}", normalize_term(key)))
    }

    pub fn banned(phrase: &str) -> Self {
        Self(format!("banned:{}", normalize_term(phrase)))
    }

    pub fn structure(category: Category, section: &str) -> Self {
        Self(format!("structure:{category}:{}", normalize_term(section)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> RuleKind {
        if self.0.starts_with("term:") {
            RuleKind::Term
        } else if self.0.starts_with("banned:") {
            RuleKind::Banned
        } else {
            RuleKind::Structure
        }
    }

    /// Target of the rule without its kind prefix.
    pub fn target(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, rest)| rest)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RuleId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unknown = || ValidationError::UnknownRule { id: s.to_string() };
        let (kind, target) = trimmed.split_once(':').ok_or_else(unknown)?;
        if target.trim().is_empty() {
            return Err(unknown());
        }
        match kind {
            "term" => Ok(Self::term(target)),
            "banned" => Ok(Self::banned(target)),
            "structure" => {
                let (category, section) = target.split_once(':').ok_or_else(unknown)?;
                let category: Category = category.parse()?;
                Ok(Self::structure(category, section))
            }
            _ => Err(unknown()),
        }
    }
}

/// Learned weight of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleState {
    pub confidence: f64,
    pub active: bool,
    #[serde(default)]
    pub reinforcements: u32,
    #[serde(default)]
    pub penalties: u32,
    /// Profile version that switched the rule off, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated_in: Option<u64>,
}

impl RuleState {
    pub fn new(confidence: f64) -> Self {
        Self {
            confidence,
            active: true,
            reinforcements: 0,
            penalties: 0,
            deactivated_in: None,
        }
    }
}

/// Lowercase, trim and collapse inner whitespace.
pub fn normalize_term(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
