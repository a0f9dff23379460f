//! Result cards and score-breakdown panel

use super::{format_optional_score, format_percent, format_score};
use crate::api::{SearchResult, SearchStats};
use crate::config::WeightVector;

const SNIPPET_WIDTH: usize = 200;

/// One result card, 1-based `rank`
pub fn render_card(rank: usize, result: &SearchResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}. {} [{}]\n",
        rank,
        result.display_title(),
        format_percent(result.scores.final_score)
    ));

    let mut details = Vec::new();
    if let Some(kind) = result.metadata.component_type {
        details.push(kind.to_string());
    }
    if let Some(file) = result.metadata.file_name.as_deref() {
        details.push(file.to_string());
    }
    if !result.metadata.tags.is_empty() {
        details.push(format!("tags: {}", result.metadata.tags.join(", ")));
    }
    if !details.is_empty() {
        out.push_str(&format!("   {}\n", details.join(" | ")));
    }

    let snippet = truncate(&result.snippet, SNIPPET_WIDTH);
    if !snippet.is_empty() {
        out.push_str(&format!("   {}\n", snippet));
    }

    out.push_str(&format!(
        "   vector {} • cross {} • meta {} • final {}\n",
        format_optional_score(result.scores.vector),
        format_optional_score(result.scores.cross_encoder),
        format_optional_score(result.scores.metadata_boost),
        format_score(result.scores.final_score)
    ));

    if result.has_enrichments() {
        out.push_str(&render_enrichments(result));
    }
    out
}

/// Header plus one card per result
pub fn render_results(query: &str, results: &[SearchResult], stats: Option<SearchStats>) -> String {
    if results.is_empty() {
        return format!("No results found for '{}'\n", query);
    }

    let mut out = String::new();
    match stats {
        Some(stats) => {
            out.push_str(&format!(
                "Found {} results for '{}' ({:.0}ms):\n\n",
                stats.total, query, stats.elapsed_ms
            ));
        }
        None => {
            out.push_str(&format!("Found {} results for '{}':\n\n", results.len(), query));
        }
    }
    for (i, result) in results.iter().enumerate() {
        out.push_str(&render_card(i + 1, result));
        out.push('\n');
    }
    out
}

/// Knowledge-graph and web enrichments attached by the agentic endpoint
pub fn render_enrichments(result: &SearchResult) -> String {
    let mut out = String::new();

    let graph_sections = [
        ("Related components", &result.related_components),
        ("Dependencies", &result.dependencies),
        ("Integration patterns", &result.integration_patterns),
    ];
    for (label, items) in graph_sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("   {}:\n", label));
        for item in items.iter() {
            out.push_str(&format!("     - {} ({})", item.name, item.kind));
            if !item.relationship_type.is_empty() {
                out.push_str(&format!(" {}", item.relationship_type));
            }
            out.push('\n');
        }
    }

    if !result.web_updates.is_empty() {
        out.push_str("   Web updates:\n");
        for update in &result.web_updates {
            out.push_str(&format!("     - {} <{}>", update.title, update.url));
            if let Some(date) = update.published_date.as_deref() {
                out.push_str(&format!(" {}", date));
            }
            out.push('\n');
        }
    }

    if let Some(info) = result.latest_info.as_deref() {
        out.push_str(&format!("   Latest: {}\n", info));
    }

    if let Some(breakdown) = result.source_breakdown {
        out.push_str(&format!(
            "   Sources: vector {} • kg {} • web {}\n",
            format_percent(breakdown.vector),
            format_percent(breakdown.kg),
            format_percent(breakdown.web)
        ));
    }
    out
}

/// Weight sliders plus per-result score lines
pub fn render_score_breakdown(weights: &WeightVector, results: &[SearchResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Weights: dense {:.1} • cross {:.1} • meta {:.1}\n",
        weights.dense, weights.cross, weights.meta
    ));
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<40} vector {:>6} cross {:>6} meta {:>6} final {:>6}\n",
            i + 1,
            truncate(result.display_title(), 40),
            format_optional_score(result.scores.vector),
            format_optional_score(result.scores.cross_encoder),
            format_optional_score(result.scores.metadata_boost),
            format_score(result.scores.final_score)
        ));
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= width {
        return flat;
    }
    let cut: String = flat.chars().take(width).collect();
    format!("{}...", cut)
}
