use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Kind of business text a request targets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    InternalCommunication,
    CommercialEmail,
    Recognition,
    DiversityContent,
    ServiceProposal,
}

impl Category {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Human label used in prompts and CLI listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::InternalCommunication => "comunicación interna",
            Self::CommercialEmail => "correo comercial",
            Self::Recognition => "reconocimiento",
            Self::DiversityContent => "contenido de diversidad",
            Self::ServiceProposal => "propuesta de servicio",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::iter()
            .find(|category| category.to_string() == normalized)
            .ok_or_else(|| ValidationError::UnsupportedCategory {
                value: s.to_string(),
            })
    }
}
