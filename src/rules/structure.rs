use super::engine::CorrectionApplied;
use crate::style::{Category, RuleId, normalize_term};

/// Whether `line` is a heading for `section`.
///
/// Heading decoration (`#`, `*`, `_`, a trailing colon) is ignored, as is
/// case.
pub fn is_marker(line: &str, section: &str) -> bool {
    let stripped = line
        .trim()
        .trim_start_matches(['#', '*', '_'])
        .trim_end_matches(['*', '_'])
        .trim()
        .trim_end_matches(':')
        .trim_end_matches(['*', '_'])
        .trim();
    !stripped.is_empty() && normalize_term(stripped) == normalize_term(section)
}

pub fn stub(section: &str, placeholder: &str) -> String {
    format!("## {section}\n{placeholder}")
}

/// Make `text` carry every section of the template, in template order.
///
/// When the present sections already follow the template, a stub is
/// inserted for each missing one right before the next section that is
/// present, or at the end when none follows. Otherwise the text is rebuilt
/// section by section in template order, stubbing the missing ones.
pub fn complete(
    text: &str,
    category: Category,
    sections: &[String],
    placeholder: &str,
    corrections: &mut Vec<CorrectionApplied>,
) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let markers: Vec<Option<usize>> = lines
        .iter()
        .map(|line| sections.iter().position(|section| is_marker(line, section)))
        .collect();
    let positions: Vec<Option<usize>> = (0..sections.len())
        .map(|idx| markers.iter().position(|m| *m == Some(idx)))
        .collect();

    let present: Vec<usize> = positions.iter().flatten().copied().collect();
    if !present.windows(2).all(|pair| pair[0] < pair[1]) {
        return reorder(&lines, &markers, &positions, category, sections, placeholder, corrections);
    }
    if present.len() == sections.len() {
        return text.to_string();
    }

    let mut before_line: Vec<Vec<String>> = vec![Vec::new(); lines.len()];
    let mut trailing: Vec<String> = Vec::new();

    for (idx, section) in sections.iter().enumerate() {
        if positions[idx].is_some() {
            continue;
        }
        let block = stub_correction(category, section, placeholder, corrections);
        match positions[idx + 1..].iter().flatten().next() {
            Some(&line) => before_line[line].push(block),
            None => trailing.push(block),
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + sections.len());
    for (idx, line) in lines.iter().enumerate() {
        for block in before_line[idx].drain(..) {
            out.push(block);
            out.push(String::new());
        }
        out.push((*line).to_string());
    }
    let body = out.join("\n");

    if trailing.is_empty() {
        return body;
    }
    let tail = trailing.join("\n\n");
    let head = body.trim_end();
    if head.is_empty() {
        tail
    } else {
        format!("{head}\n\n{tail}")
    }
}

fn stub_correction(
    category: Category,
    section: &str,
    placeholder: &str,
    corrections: &mut Vec<CorrectionApplied>,
) -> String {
    let block = stub(section, placeholder);
    corrections.push(CorrectionApplied {
        rule_id: RuleId::structure(category, section),
        original_span: String::new(),
        replacement: block.clone(),
    });
    block
}

/// Rebuild out-of-order text in template order.
///
/// Every marker line opens a block that runs to the next marker. Blocks are
/// grouped by section (repeated headings stay with their section) and text
/// before the first marker is kept on top. A section that changed rank
/// records its heading as both span and replacement.
fn reorder(
    lines: &[&str],
    markers: &[Option<usize>],
    positions: &[Option<usize>],
    category: Category,
    sections: &[String],
    placeholder: &str,
    corrections: &mut Vec<CorrectionApplied>,
) -> String {
    let starts: Vec<usize> = (0..lines.len()).filter(|&i| markers[i].is_some()).collect();
    let mut parts: Vec<String> = Vec::with_capacity(starts.len() + sections.len() + 1);

    let first = starts.first().copied().unwrap_or(lines.len());
    let preamble = lines[..first].join("\n");
    if !preamble.trim().is_empty() {
        parts.push(preamble.trim_end().to_string());
    }

    let mut first_seen: Vec<usize> = positions.iter().flatten().copied().collect();
    first_seen.sort_unstable();
    let mut template_rank = 0;

    for (idx, section) in sections.iter().enumerate() {
        let Some(heading) = positions[idx] else {
            parts.push(stub_correction(category, section, placeholder, corrections));
            continue;
        };
        if first_seen.get(template_rank) != Some(&heading) {
            let line = lines[heading].trim().to_string();
            corrections.push(CorrectionApplied {
                rule_id: RuleId::structure(category, section),
                original_span: line.clone(),
                replacement: line,
            });
        }
        template_rank += 1;

        for (n, &start) in starts.iter().enumerate() {
            if markers[start] != Some(idx) {
                continue;
            }
            let end = starts.get(n + 1).copied().unwrap_or(lines.len());
            parts.push(lines[start..end].join("\n").trim_end().to_string());
        }
    }

    parts.join("\n\n")
}
