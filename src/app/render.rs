use super::style::{cyan, dim, header, success, value, yellow};
use brandvoice::feedback::{FeedbackEvent, GeneratedArtifact};
use brandvoice::learning::FoldReport;
use brandvoice::style::{Candidate, CandidateStatus, RuleId, RuleState};
use std::fmt::Write as _;

pub fn artifact(artifact: &GeneratedArtifact) -> String {
    let mut out = String::new();
    let label = artifact
        .option_label
        .as_deref()
        .map(|l| format!(" · {l}"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{} {}{label}",
        header(format!("◆ {} {}", artifact.kind, artifact.category)),
        dim(format!(
            "[{} · v{} · {}]",
            artifact.backend, artifact.style_profile_version, artifact.artifact_id
        )),
    );
    if let Some(source) = &artifact.source_id {
        let _ = writeln!(out, "  {} {}", cyan("corrects"), dim(source));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", artifact.final_text);

    if !artifact.corrections.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", header("Corrections"));
        for correction in &artifact.corrections {
            let replacement = if correction.replacement.is_empty() {
                yellow("(removed, review manually)")
            } else {
                value(&correction.replacement)
            };
            let _ = writeln!(
                out,
                "  {} {} → {}",
                dim(&correction.rule_id),
                correction.original_span,
                replacement
            );
        }
    }
    out
}

pub fn event(event: &FeedbackEvent) -> String {
    let stars = "★".repeat(usize::from(event.rating)) + &"☆".repeat(5 - usize::from(event.rating));
    let mut line = format!(
        "{} {} {} {}",
        dim(event.timestamp.format("%Y-%m-%d %H:%M")),
        stars,
        cyan(event.category),
        dim(&event.artifact_id),
    );
    if let Some(comment) = event.comment_text() {
        let _ = write!(line, "\n    “{comment}”");
    }
    line
}

pub fn report(report: &FoldReport, version: u64) -> String {
    if report.is_noop() {
        return format!(
            "{} nothing new to learn ({} already processed, profile v{version})",
            dim("·"),
            report.skipped
        );
    }
    let mut out = format!(
        "{} folded {} event(s) into profile v{version}\n",
        success("✓"),
        report.folded
    );
    let counts = [
        ("superseded", report.superseded),
        ("reverted", report.reverted),
        ("reinforced", report.reinforced),
        ("penalized", report.penalized),
        ("promoted", report.promoted),
        ("skipped", report.skipped),
    ];
    for (label, count) in counts.into_iter().filter(|(_, count)| *count > 0) {
        let _ = writeln!(out, "  {:<12} {count}", cyan(label));
    }
    for rule in &report.deactivated {
        let _ = writeln!(out, "  {} {}", yellow("deactivated"), rule);
    }
    for candidate in &report.staged {
        let _ = writeln!(out, "  {} {} (run `brandvoice candidates`)", value("staged"), candidate);
    }
    out
}

pub fn candidate(candidate: &Candidate) -> String {
    let proposal = candidate
        .applied_term
        .as_deref()
        .or(candidate.proposed.as_deref())
        .map_or_else(|| yellow("(no proposal)"), value);
    let status = match candidate.status {
        CandidateStatus::Staged => yellow(candidate.status),
        CandidateStatus::Confirmed => success(candidate.status),
        CandidateStatus::Rejected => dim(candidate.status),
    };
    format!(
        "{} {} → {} {} {}",
        header(&candidate.id),
        candidate.discouraged,
        proposal,
        status,
        dim(format!("support {} · staged in v{}", candidate.support, candidate.staged_in)),
    )
}

pub fn rule(id: &RuleId, state: Option<&RuleState>) -> String {
    match state {
        None => format!("{} {}", value("●"), id),
        Some(state) if state.active => format!(
            "{} {} {}",
            value("●"),
            id,
            dim(format!(
                "confidence {:.2} · +{} / -{}",
                state.confidence, state.reinforcements, state.penalties
            ))
        ),
        Some(state) => format!(
            "{} {} {}",
            yellow("○"),
            id,
            dim(format!(
                "confidence {:.2} · off since v{}",
                state.confidence,
                state
                    .deactivated_in
                    .map_or_else(|| "?".to_string(), |v| v.to_string())
            ))
        ),
    }
}
