use super::traits::{CompletionFuture, TextBackend};
use crate::generation::PromptContext;
use crate::rules::ApplyMode;
use crate::style::normalize_term;
use tera::{Context, Tera};

pub const SIMULATOR_NAME: &str = "simulator";

const GENERIC_BODY: &str = "Sobre {{ subject }} queremos hablarles con el tono {{ tone }} que nos caracteriza en {{ company }}.";

/// Body template for a known section name (normalized).
fn body_template(section: &str) -> &'static str {
    match section {
        "reflexión" => {
            "En {{ company }} nos detenemos a pensar en {{ subject }} y en lo que significa para cada persona de nuestro equipo."
        }
        "reconocimiento" => {
            "Reconocemos el esfuerzo diario de nuestros colaboradores, que con compromiso hacen posible cada logro de {{ company }}."
        }
        "mensaje" => {
            "Con motivo de {{ subject }}, compartimos un mensaje sencillo: cada aporte cuenta y construye la familia {{ company }}."
        }
        "inspiración" => {
            "Sigamos adelante con la misma energía y el mismo propósito; juntos hacemos de {{ subject }} una oportunidad para crecer."
        }
        "saludo" => "Estimado equipo, reciban un cordial saludo de parte de {{ company }}.",
        "contexto" => "Queremos contarles sobre {{ subject }} y el momento que vivimos como organización.",
        "propuesta de valor" => {
            "{{ company }} ofrece un servicio de excelencia, respaldado por un equipo comprometido y cercano."
        }
        "llamado a la acción" => "Los invitamos a conversar con nosotros para dar el siguiente paso.",
        "despedida" => "Con aprecio, el equipo de {{ company }}.",
        "logros" => {
            "Destacamos lo alcanzado en torno a {{ subject }}, fruto de la dedicación de cada colaborador."
        }
        "impacto" => "Su trabajo transforma espacios y deja huella en cada cliente y en cada compañero.",
        "agradecimiento" => {
            "Gracias por ser parte de la familia {{ company }} y por su dedicación constante."
        }
        "compromiso" => {
            "Renovamos nuestro compromiso con la diversidad, el respeto y la inclusión en todo lo que hacemos."
        }
        "presentación" => "{{ company }} presenta una propuesta pensada para {{ subject }}.",
        "necesidad" => "Entendemos la necesidad de contar con un aliado confiable y cercano.",
        "solución" => {
            "Proponemos una solución integral, ejecutada por un equipo capacitado y comprometido."
        }
        "beneficios" => "Calidad constante, atención cercana y resultados medibles.",
        "próximos pasos" => "Agendemos una reunión para ajustar los detalles y comenzar.",
        _ => GENERIC_BODY,
    }
}

/// Deterministic local backend that closes every fallback chain.
///
/// Generation fills the category's sections with on-style boilerplate;
/// correction returns the source untouched so only the rule engine edits it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatorBackend;

impl SimulatorBackend {
    pub fn render(&self, context: &PromptContext) -> String {
        match context.mode {
            ApplyMode::Correction => context.subject.clone(),
            ApplyMode::Generation => self.compose(context),
        }
    }

    fn compose(&self, context: &PromptContext) -> String {
        let mut vars = Context::new();
        vars.insert("subject", &context.subject);
        vars.insert("company", &context.company_name);
        vars.insert(
            "tone",
            context.tone.first().map_or("cercano", String::as_str),
        );

        let fill = |template: &str| {
            Tera::one_off(template, &vars, false).unwrap_or_else(|err| {
                tracing::debug!(error = %err, "simulator template failed; using subject");
                context.subject.clone()
            })
        };

        if context.sections.is_empty() {
            return fill(GENERIC_BODY);
        }
        context
            .sections
            .iter()
            .map(|section| {
                let body = fill(body_template(&normalize_term(section)));
                format!("## {section}\n{body}")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl TextBackend for SimulatorBackend {
    fn name(&self) -> &str {
        SIMULATOR_NAME
    }

    fn complete<'a>(
        &'a self,
        context: &'a PromptContext,
        _instruction: &'a str,
        _max_length: usize,
    ) -> CompletionFuture<'a> {
        Box::pin(async move { Ok(self.render(context)) })
    }
}
