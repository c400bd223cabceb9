use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Creative angle a variant is written from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Approach {
    CorporativoInspiracional,
    NarrativoEmocional,
    CercanoFamiliar,
    MotivacionalEnergico,
    ReflexivoProfundo,
}

impl Approach {
    /// Label shown next to a variant.
    pub fn label(self) -> &'static str {
        match self {
            Self::CorporativoInspiracional => "Profesional",
            Self::NarrativoEmocional => "Emotiva",
            Self::CercanoFamiliar => "Cercana",
            Self::MotivacionalEnergico => "Motivacional",
            Self::ReflexivoProfundo => "Reflexiva",
        }
    }

    pub fn temperature(self) -> f64 {
        match self {
            Self::CorporativoInspiracional => 0.7,
            Self::NarrativoEmocional => 0.9,
            Self::CercanoFamiliar => 1.1,
            Self::MotivacionalEnergico => 0.8,
            Self::ReflexivoProfundo => 1.0,
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Self::CorporativoInspiracional => {
                "Mantén un tono profesional pero inspirador. Enfócate en logros y visión empresarial."
            }
            Self::NarrativoEmocional => {
                "Usa un tono narrativo que conecte emocionalmente. Incluye anécdotas o reflexiones personales."
            }
            Self::CercanoFamiliar => {
                "Usa un lenguaje cálido y familiar, como si hablaras con un amigo cercano."
            }
            Self::MotivacionalEnergico => {
                "Genera energía y motivación. Usa lenguaje dinámico y llamadas a la acción."
            }
            Self::ReflexivoProfundo => "Invita a la reflexión profunda sobre valores y propósito.",
        }
    }

    pub fn vocabulary(self) -> &'static [&'static str] {
        match self {
            Self::CorporativoInspiracional => {
                &["lideramos", "innovamos", "trascendemos", "construimos", "proyectamos"]
            }
            Self::NarrativoEmocional => {
                &["sentimos", "vivimos", "experimentamos", "compartimos", "recordamos"]
            }
            Self::CercanoFamiliar => &["familia", "hogar", "juntos", "unidos", "cercanía"],
            Self::MotivacionalEnergico => {
                &["energía", "pasión", "impulso", "fuerza", "determinación", "acción"]
            }
            Self::ReflexivoProfundo => {
                &["reflexión", "propósito", "esencia", "significado", "trascendencia"]
            }
        }
    }

    pub fn word_range(self) -> &'static str {
        match self {
            Self::CorporativoInspiracional | Self::MotivacionalEnergico => "200-300",
            Self::NarrativoEmocional => "250-350",
            Self::CercanoFamiliar => "150-250",
            Self::ReflexivoProfundo => "300-400",
        }
    }

    /// How many distinct approaches exist.
    pub fn count() -> usize {
        Self::iter().count()
    }

    /// The first `n` approaches, cycling when `n` exceeds the set.
    pub fn rotation(n: usize) -> Vec<Self> {
        Self::iter().cycle().take(n).collect()
    }

    /// Pick an approach from keywords in the request.
    pub fn suggest(instruction: &str) -> Self {
        let lower = instruction.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if mentions(&["día", "celebr", "felicit", "reconoc"]) {
            Self::NarrativoEmocional
        } else if mentions(&["mujer", "madre", "padre", "familia"]) {
            Self::CercanoFamiliar
        } else if mentions(&["logro", "meta", "objetivo", "éxito"]) {
            Self::MotivacionalEnergico
        } else {
            Self::CorporativoInspiracional
        }
    }
}
