use super::category::Category;
use super::ledger::LearningLedger;
use super::rules::{RuleId, RuleKind, RuleState, normalize_term};
use crate::error::ValidationError;
use crate::rules::matcher::contains_phrase;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An example text the backends imitate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleText {
    pub category: Category,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    /// Set when the example was promoted from a well-rated artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_artifact: Option<String>,
}

/// The organization's voice: terminology, tone, structure and examples.
///
/// Versioned and immutable once published; the learning adapter is the only
/// code that produces a successor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub version: u64,
    pub company_name: String,
    #[serde(default)]
    pub mission: String,
    pub values: BTreeSet<String>,
    /// Discouraged term (normalized) -> preferred term.
    pub preferred_terms: BTreeMap<String, String>,
    pub banned_phrases: BTreeSet<String>,
    /// Optional replacement for a banned phrase; absent means removal.
    #[serde(default)]
    pub safe_substitutes: BTreeMap<String, String>,
    #[serde(default)]
    pub preferred_vocabulary: Vec<String>,
    pub tone_descriptors: Vec<String>,
    pub structure_templates: BTreeMap<Category, Vec<String>>,
    /// Oldest first.
    pub example_texts: Vec<ExampleText>,
    #[serde(default)]
    pub rules: BTreeMap<RuleId, RuleState>,
    #[serde(default)]
    pub ledger: LearningLedger,
}

impl StyleProfile {
    pub fn sections(&self, category: Category) -> &[String] {
        self.structure_templates
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// Examples for `category`, most recent first.
    pub fn examples_for(&self, category: Category) -> impl Iterator<Item = &ExampleText> {
        self.example_texts
            .iter()
            .rev()
            .filter(move |example| example.category == category)
    }

    /// Rules without recorded state are active.
    pub fn is_rule_active(&self, id: &RuleId) -> bool {
        self.rules.get(id).is_none_or(|state| state.active)
    }

    /// Every rule the profile declares, with its state when one was learned.
    pub fn declared_rules(&self) -> Vec<(RuleId, Option<&RuleState>)> {
        let mut ids: BTreeSet<RuleId> = self.preferred_terms.keys().map(|k| RuleId::term(k)).collect();
        ids.extend(self.banned_phrases.iter().map(|p| RuleId::banned(p)));
        for (category, sections) in &self.structure_templates {
            ids.extend(sections.iter().map(|s| RuleId::structure(*category, s)));
        }
        ids.extend(self.rules.keys().cloned());
        ids.into_iter()
            .map(|id| {
                let state = self.rules.get(&id);
                (id, state)
            })
            .collect()
    }

    pub fn declares_rule(&self, id: &RuleId) -> bool {
        match id.kind() {
            RuleKind::Term => self.preferred_terms.contains_key(id.target()),
            RuleKind::Banned => self.banned_phrases.contains(id.target()),
            RuleKind::Structure => self.structure_templates.iter().any(|(category, sections)| {
                sections
                    .iter()
                    .any(|s| RuleId::structure(*category, s) == *id)
            }),
        }
    }

    /// Check every structural invariant of the profile.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let keys: BTreeSet<&str> = self.preferred_terms.keys().map(String::as_str).collect();

        for (key, value) in &self.preferred_terms {
            let rule = || RuleId::term(key).to_string();
            let invalid = |reason: String| ValidationError::InvalidRule {
                rule: rule(),
                reason,
            };
            if key.is_empty() || *key != normalize_term(key) {
                return Err(invalid("key must be lowercase and trimmed".into()));
            }
            if value.trim().is_empty() {
                return Err(invalid("preferred term is empty".into()));
            }
            if normalize_term(value) == *key {
                return Err(invalid("term maps to itself".into()));
            }
            if let Some(other) = keys.iter().find(|k| contains_phrase(value, k)) {
                return Err(invalid(format!(
                    "preferred term '{value}' contains discouraged term '{other}'"
                )));
            }
            if let Some(banned) = self
                .banned_phrases
                .iter()
                .find(|b| contains_phrase(value, b))
            {
                return Err(invalid(format!(
                    "preferred term '{value}' contains banned phrase '{banned}'"
                )));
            }
        }

        for phrase in &self.banned_phrases {
            let invalid = |reason: &str| ValidationError::InvalidRule {
                rule: RuleId::banned(phrase).to_string(),
                reason: reason.to_string(),
            };
            if phrase.is_empty() || *phrase != normalize_term(phrase) {
                return Err(invalid("phrase must be lowercase and trimmed"));
            }
            if keys.contains(phrase.as_str()) {
                return Err(invalid("phrase is also a discouraged term"));
            }
        }

        for (phrase, substitute) in &self.safe_substitutes {
            let invalid = |reason: &str| ValidationError::InvalidRule {
                rule: RuleId::banned(phrase).to_string(),
                reason: reason.to_string(),
            };
            if !self.banned_phrases.contains(phrase) {
                return Err(invalid("substitute declared for a phrase that is not banned"));
            }
            if self
                .banned_phrases
                .iter()
                .any(|b| contains_phrase(substitute, b))
            {
                return Err(invalid("substitute contains a banned phrase"));
            }
            if keys.iter().any(|k| contains_phrase(substitute, k)) {
                return Err(invalid("substitute contains a discouraged term"));
            }
        }

        for (category, sections) in &self.structure_templates {
            let mut seen = BTreeSet::new();
            for section in sections {
                let normalized = normalize_term(section);
                if normalized.is_empty() || !seen.insert(normalized) {
                    return Err(ValidationError::InvalidRule {
                        rule: RuleId::structure(*category, section).to_string(),
                        reason: "section names must be non-empty and unique".into(),
                    });
                }
                // A rewritten heading no longer marks its section.
                if let Some(key) = keys.iter().find(|k| contains_phrase(section, k)) {
                    return Err(ValidationError::InvalidRule {
                        rule: RuleId::term(key).to_string(),
                        reason: format!("discouraged term would rewrite the '{section}' heading"),
                    });
                }
                if let Some(phrase) = self
                    .banned_phrases
                    .iter()
                    .find(|b| contains_phrase(section, b))
                {
                    return Err(ValidationError::InvalidRule {
                        rule: RuleId::banned(phrase).to_string(),
                        reason: format!("banned phrase would rewrite the '{section}' heading"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Insert a discouraged -> preferred mapping, keeping the invariants.
    pub fn insert_preferred_term(
        &mut self,
        discouraged: &str,
        preferred: &str,
    ) -> Result<(), ValidationError> {
        let key = normalize_term(discouraged);
        let preferred = preferred.trim().to_string();
        let previous = self.preferred_terms.insert(key.clone(), preferred);
        if let Err(err) = self.validate() {
            match previous {
                Some(old) => self.preferred_terms.insert(key, old),
                None => self.preferred_terms.remove(&key),
            };
            return Err(err);
        }
        Ok(())
    }

    /// Default voice for Casa Limpia Colombia.
    pub fn seed() -> Self {
        let preferred_terms = [
            ("empleados", "colaboradores"),
            ("empleado", "colaborador"),
            ("trabajadores", "miembros del equipo"),
            ("trabajador", "miembro del equipo"),
            ("personal", "equipo"),
            ("compañía", "empresa"),
            ("muy bueno", "excelente"),
            ("felicitaciones", "reconocimiento"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let banned_phrases: BTreeSet<String> = [
            "a quien corresponda",
            "sin más por el momento",
            "recursos humanos baratos",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let safe_substitutes = [("a quien corresponda", "Estimado equipo")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let structure_templates = [
            (
                Category::InternalCommunication,
                vec!["Reflexión", "Reconocimiento", "Mensaje", "Inspiración"],
            ),
            (
                Category::CommercialEmail,
                vec!["Saludo", "Contexto", "Propuesta de valor", "Llamado a la acción", "Despedida"],
            ),
            (
                Category::Recognition,
                vec!["Reconocimiento", "Logros", "Impacto", "Agradecimiento"],
            ),
            (
                Category::DiversityContent,
                vec!["Contexto", "Reflexión", "Compromiso", "Inspiración"],
            ),
            (
                Category::ServiceProposal,
                vec!["Presentación", "Necesidad", "Solución", "Beneficios", "Próximos pasos"],
            ),
        ]
        .into_iter()
        .map(|(category, sections)| (category, sections.into_iter().map(String::from).collect()))
        .collect();

        Self {
            version: 1,
            company_name: "Casa Limpia Colombia".into(),
            mission: "Somos una empresa líder en servicios de limpieza y mantenimiento.".into(),
            values: ["Calidad", "Compromiso", "Responsabilidad", "Excelencia"]
                .into_iter()
                .map(String::from)
                .collect(),
            preferred_terms,
            banned_phrases,
            safe_substitutes,
            preferred_vocabulary: vec![
                "colaboradores".into(),
                "equipo".into(),
                "familia Casa Limpia".into(),
            ],
            tone_descriptors: vec![
                "profesional y cercano".into(),
                "cálido".into(),
                "agradecido".into(),
                "inspirador".into(),
            ],
            structure_templates,
            example_texts: seed_examples(),
            rules: BTreeMap::new(),
            ledger: LearningLedger::default(),
        }
    }
}

fn seed_examples() -> Vec<ExampleText> {
    [
        (
            Category::InternalCommunication,
            "Halloween",
            "Hoy celebramos Halloween, una fecha que nos invita a recordar el valor de la creatividad, la imaginación y la alegría de compartir momentos especiales, incluso en medio de la rutina. En esta época llena de colores, disfraces y tradiciones, queremos reconocer el esfuerzo que cada uno de ustedes pone día a día para que nuestra empresa siga creciendo. Que este día sea una oportunidad para sonreír, disfrutar y renovar energías con un toque de magia. ¡Gracias por ser parte de esta Gran Familia Casa Limpia y por ponerle el alma a todo lo que hacen!",
        ),
        (
            Category::Recognition,
            "Día del Operario",
            "Gracias por ser el corazón que mantiene todo en orden. Hoy queremos detenernos un momento para reconocer, con profunda gratitud y admiración, la labor silenciosa, constante y valiente que realizan todos ustedes, nuestros operarios y operarias de limpieza. Ustedes son mucho más que parte de esta empresa: son el alma de nuestro servicio, el reflejo de nuestro compromiso y el motor que nos impulsa a seguir siendo líderes en lo que hacemos. ¡Feliz Día del Operario de Limpieza!",
        ),
        (
            Category::DiversityContent,
            "Día de la Raza",
            "Hoy, en el Día de la Raza, en Casa Limpia conmemoramos la riqueza cultural, histórica y étnica que nos caracteriza como sociedad y como organización. Esta fecha nos invita a reflexionar sobre el encuentro de culturas que marcó nuestra historia, y sobre la importancia de construir, desde el respeto y la inclusión, una convivencia que valore las diferencias y abrace la diversidad. Somos más de 16.000 colaboradores, cada uno con una historia, un origen, una identidad.",
        ),
        (
            Category::InternalCommunication,
            "Día de los Animales",
            "Celebramos este día con el objetivo de reconocer la importancia de todas las especies en el equilibrio del planeta y promover una relación más respetuosa entre los seres humanos y los animales. Esta fecha nos invita a reflexionar sobre el bienestar animal, la conservación de la biodiversidad y el compromiso con un mundo más justo para todos los seres vivos.",
        ),
    ]
    .into_iter()
    .map(|(category, occasion, text)| ExampleText {
        category,
        text: text.to_string(),
        occasion: Some(occasion.to_string()),
        source_artifact: None,
    })
    .collect()
}
