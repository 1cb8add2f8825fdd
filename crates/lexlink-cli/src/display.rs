//! Human-readable card display for citation results.
//!
//! Renders one [`CitationResult`] as a header, a short summary section, and
//! one line per citation with the structural fields that are set.

use lexlink_core::{Citation, CitationResult, Scope, format_article};

const MAX_CITATIONS: usize = 50;

// ── Public API ──

/// Print a citation result as a vertical card.
pub fn print_citation_card(result: &CitationResult) {
    println!("=== {} {} ===", result.law_name, result.article);

    if !result.success {
        println!("  {:<16} failed", "status");
        for err in &result.errors {
            println!("  {:<16} {}", "error", err);
        }
        println!();
        return;
    }

    println!("  {:<16} {}", "law_id", result.law_id);
    println!("  {:<16} {}", "citations", result.citation_count);
    println!("  {:<16} {}", "internal", result.internal_count);
    println!("  {:<16} {}", "external", result.external_count);
    println!("  {:<16} {:.2} ms", "elapsed", result.processing_time_ms);

    if !result.citations.is_empty() {
        println!();
        println!("Citations");
        for (i, c) in result.citations.iter().take(MAX_CITATIONS).enumerate() {
            println!("  {:>3}. {:<9} {:<40} {}", i + 1, scope_label(c.scope), target(c), c.display_text);
        }
        if result.citations.len() > MAX_CITATIONS {
            println!("       ... and {} more", result.citations.len() - MAX_CITATIONS);
        }
    }
    println!();
}

// ── Formatting ──

fn scope_label(scope: Scope) -> &'static str {
    match scope {
        Scope::Internal => "internal",
        Scope::External => "external",
        Scope::Unknown => "unknown",
    }
}

/// "형법 제20조 제1항 제2호가목", leaving out the parts that are unset.
fn target(c: &Citation) -> String {
    let mut parts: Vec<String> = Vec::new();
    if c.scope == Scope::External
        && let Some(law) = &c.law_name
    {
        parts.push(law.clone());
    }
    if let Some(article) = c.article {
        parts.push(format_article(article, c.article_branch.unwrap_or(0)));
    }
    if let Some(p) = c.paragraph {
        parts.push(format!("제{p}항"));
    }
    match (c.item, &c.subitem) {
        (Some(i), Some(sub)) => parts.push(format!("제{i}호{sub}목")),
        (Some(i), None) => parts.push(format!("제{i}호")),
        (None, Some(sub)) => parts.push(format!("{sub}목")),
        (None, None) => {}
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}
