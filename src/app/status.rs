use super::style::{cyan, dim, header, value, yellow};
use brandvoice::{Config, Engine};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub workspace: String,
    pub config: String,
    pub database: String,
    pub backend_chain: Vec<String>,
    pub profile_version: u64,
    pub company: String,
    pub preferred_terms: usize,
    pub banned_phrases: usize,
    pub inactive_rules: usize,
    pub staged_candidates: usize,
    pub feedback_events: u64,
    pub pending_events: usize,
}

pub async fn collect(config: &Config, engine: &Engine) -> anyhow::Result<StatusReport> {
    let profile = engine.profile();
    let feedback_events = engine.persistence().count_events().await?;
    let inactive_rules = profile.rules.values().filter(|state| !state.active).count();
    let pending_events = engine
        .learning()
        .pending_events(&profile, engine.feedback())
        .await?
        .len();

    Ok(StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        workspace: config.workspace_dir.display().to_string(),
        config: config.config_path.display().to_string(),
        database: config.database_path().display().to_string(),
        backend_chain: engine
            .orchestrator()
            .chain()
            .backend_names()
            .into_iter()
            .map(String::from)
            .collect(),
        profile_version: profile.version,
        company: profile.company_name.clone(),
        preferred_terms: profile.preferred_terms.len(),
        banned_phrases: profile.banned_phrases.len(),
        inactive_rules,
        staged_candidates: profile.ledger.staged_candidates().count(),
        feedback_events,
        pending_events,
    })
}

pub fn render_status(report: &StatusReport) -> String {
    let mut lines = vec![
        header(format!("◆ brandvoice {}", report.version)),
        String::new(),
        format!("  {}  {}", cyan("workspace"), report.workspace),
        format!("  {}     {}", cyan("config"), report.config),
        format!("  {}   {}", cyan("database"), report.database),
        format!("  {}   {}", cyan("backends"), report.backend_chain.join(" → ")),
        String::new(),
        format!(
            "  {}    {} {}",
            cyan("profile"),
            value(format!("v{}", report.profile_version)),
            dim(&report.company)
        ),
        format!(
            "  {}      {} preferred · {} banned",
            cyan("terms"),
            report.preferred_terms,
            report.banned_phrases
        ),
        format!("  {}   {} events", cyan("feedback"), report.feedback_events),
    ];

    if report.pending_events > 0 {
        lines.push(format!(
            "  {}    {}",
            cyan("pending"),
            yellow(format!(
                "{} event(s) not learned yet (run `brandvoice learn`)",
                report.pending_events
            ))
        ));
    }
    if report.inactive_rules > 0 {
        lines.push(format!(
            "  {}   {}",
            cyan("inactive"),
            yellow(format!("{} rule(s) switched off by feedback", report.inactive_rules))
        ));
    }
    if report.staged_candidates > 0 {
        lines.push(format!(
            "  {} {}",
            cyan("candidates"),
            yellow(format!("{} waiting for review", report.staged_candidates))
        ));
    }
    lines.join("\n")
}
