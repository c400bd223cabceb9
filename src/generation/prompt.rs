use super::context::PromptContext;
use crate::rules::ApplyMode;
use tera::{Context, Tera};

const GENERATE_SYSTEM: &str = r#"Eres un comunicador experto de {{ company_name }}.
{% if mission %}Misión: {{ mission }}
{% endif -%}
Tono: {{ tone | join(sep=", ") }}.
{% if values %}Valores: {{ values | join(sep=", ") }}.
{% endif -%}
{% if approach_label %}Enfoque creativo: {{ approach_label }}. {{ approach_guidance }}
{% endif -%}
{% if vocabulary %}Vocabulario preferido: {{ vocabulary | join(sep=", ") }}.
{% endif -%}
{% if terms %}Terminología de la empresa:
{% for term in terms %}- usa "{{ term.prefer }}" en lugar de "{{ term.avoid }}"
{% endfor %}{% endif -%}
{% if banned_phrases %}Nunca uses: {{ banned_phrases | join(sep="; ") }}.
{% endif -%}
{% if examples %}Referencias de estilo (no copiar, solo inspirarse):
{% for example in examples %}{{ loop.index }}. {{ example }}
{% endfor %}{% endif -%}
{% if notes %}Comentarios valorados por el equipo:
{% for note in notes %}- {{ note }}
{% endfor %}{% endif -%}"#;

const GENERATE_USER: &str = r#"Escribe un texto de tipo "{{ category_label }}" sobre: "{{ subject }}".
{% if sections %}Organízalo en estas secciones, cada una con su título en una línea propia:
{% for section in sections %}## {{ section }}
{% endfor %}{% endif -%}
Longitud aproximada: {{ word_range }} palabras.
Genera SOLO el texto final, sin explicaciones."#;

const CORRECT_SYSTEM: &str = r#"Eres un editor experto en comunicación corporativa para {{ company_name }}.
Estilo: {{ tone | join(sep=", ") }}.
{% if vocabulary %}Vocabulario preferido: {{ vocabulary | join(sep=", ") }}.
{% endif -%}
{% if terms %}Terminología de la empresa:
{% for term in terms %}- usa "{{ term.prefer }}" en lugar de "{{ term.avoid }}"
{% endfor %}{% endif -%}
{% if banned_phrases %}Expresiones a evitar: {{ banned_phrases | join(sep="; ") }}.
{% endif -%}"#;

const CORRECT_USER: &str = r#"TEXTO A CORREGIR:
"{{ subject }}"

INSTRUCCIONES:
1. Corrige errores gramaticales y ortográficos.
2. Mejora la fluidez y la claridad.
3. Adapta el vocabulario al estilo de {{ company_name }}.
4. Conserva el sentido y la extensión del original.
Proporciona ÚNICAMENTE el texto corregido, sin explicaciones."#;

/// Tera-backed prompt renderer with the built-in templates registered.
pub struct PromptTemplates {
    tera: Tera,
}

impl PromptTemplates {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("generate_system", GENERATE_SYSTEM),
            ("generate_user", GENERATE_USER),
            ("correct_system", CORRECT_SYSTEM),
            ("correct_user", CORRECT_USER),
        ])?;
        Ok(Self { tera })
    }

    /// Replace a built-in template, e.g. with an organization's own wording.
    pub fn override_template(&mut self, name: &str, content: &str) -> anyhow::Result<()> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    /// Render the system prompt into `context` and return the instruction.
    pub fn prepare(&self, context: &mut PromptContext) -> anyhow::Result<String> {
        let vars = Self::variables(context);
        let (system, user) = match context.mode {
            ApplyMode::Generation => ("generate_system", "generate_user"),
            ApplyMode::Correction => ("correct_system", "correct_user"),
        };
        context.system_prompt = self.tera.render(system, &vars)?.trim().to_string();
        Ok(self.tera.render(user, &vars)?.trim().to_string())
    }

    fn variables(context: &PromptContext) -> Context {
        let mut vars = Context::new();
        vars.insert("company_name", &context.company_name);
        vars.insert("mission", &context.mission);
        vars.insert("values", &context.values);
        vars.insert("tone", &context.tone);
        vars.insert("vocabulary", &context.vocabulary);
        vars.insert("terms", &context.terms);
        vars.insert("banned_phrases", &context.banned_phrases);
        vars.insert("sections", &context.sections);
        vars.insert("examples", &context.examples);
        vars.insert("notes", &context.notes);
        vars.insert("word_range", &context.word_range);
        vars.insert("subject", &context.subject);
        vars.insert("category_label", context.category.label());
        vars.insert("approach_label", &context.approach.map(|a| a.label()));
        vars.insert("approach_guidance", &context.approach.map(|a| a.guidance()));
        vars
    }
}
