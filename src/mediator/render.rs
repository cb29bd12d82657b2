//! Plain-text rendering of a mediated result.

use std::fmt::Write;

use super::MediatedResult;

pub fn render(result: &MediatedResult) -> String {
    let mut out = String::new();
    let files = result.ranked.len();

    let _ = writeln!(
        out,
        "Query: \"{}\"  (files={}, total_hits={}, confidence={})",
        result.query.raw.trim(),
        files,
        result.total_hits,
        result.guidance.confidence
    );
    if !result.topics.is_empty() {
        let _ = writeln!(out, "Topics: {}", result.topics.join(", "));
    }
    let facets: Vec<String> = result
        .facets
        .iter()
        .map(|(s, f)| format!("{}={} files ({} matches)", s, f.files, f.matches))
        .collect();
    let _ = writeln!(out, "Facets: {}", facets.join(" "));
    out.push('\n');

    if result.records.is_empty() {
        out.push_str("No matches found.\n");
    } else {
        let mut current: Option<&str> = None;
        for rec in &result.records {
            if current != Some(rec.path.as_str()) {
                if current.is_some() {
                    out.push('\n');
                }
                let _ = writeln!(
                    out,
                    "## {}  (score={:.2}, section={})",
                    rec.path, rec.score, rec.section
                );
                current = Some(rec.path.as_str());
            }
            let _ = writeln!(out, "  L{}: {}", rec.line, rec.snippet);
        }
    }

    out.push_str("---\n");
    let g = &result.guidance;
    if !g.preferred_tools.is_empty() {
        let _ = writeln!(out, "Preferred tools: {}", g.preferred_tools.join(" → "));
    }
    if !g.suggested_approach.is_empty() {
        let _ = writeln!(out, "Suggested approach: {}", g.suggested_approach.join(" "));
    }
    for reminder in &g.rule_reminders {
        let _ = writeln!(out, "Reminder: {}", reminder);
    }
    if !g.doc_links.is_empty() {
        out.push_str("Documentation URLs:\n");
        for link in &g.doc_links {
            let _ = writeln!(out, "  - {}: {}", link.title, link.url);
        }
    }
    if !g.suggestions.is_empty() {
        let _ = writeln!(out, "Did you mean: {}?", g.suggestions.join(", "));
    }

    out
}
