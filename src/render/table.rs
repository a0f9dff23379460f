//! Tabular views: rerank comparison, collection stats, facets

use super::{format_optional_score, format_score, MISSING};
use crate::api::{FacetsResponse, StatsResponse};
use crate::rerank::RerankComparison;
use crate::state::ExperimentPreset;

/// Which optional columns the comparison table shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonColumns {
    pub cross_encoder: bool,
    pub metadata_boost: bool,
}

/// Before/after comparison table
pub fn render_comparison(comparison: &RerankComparison, columns: ComparisonColumns) -> String {
    if comparison.is_empty() {
        return "No results to compare\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:<4} {:<32} {:>8} {:>8}", "Pos", "Title", "Before", "After"));
    if columns.cross_encoder {
        out.push_str(&format!(" {:>8}", "Cross"));
    }
    if columns.metadata_boost {
        out.push_str(&format!(" {:>8}", "Meta"));
    }
    out.push_str(&format!(" {:>6} {:>8}\n", "Move", "ΔScore"));

    for (movement, after) in comparison.movements.iter().zip(&comparison.after) {
        let title: String = comparison.title_for(&movement.id).chars().take(32).collect();
        out.push_str(&format!(
            "{:<4} {:<32} {:>8} {:>8}",
            format!("{}→{}", movement.before_position, movement.after_position),
            if title.is_empty() { MISSING.to_string() } else { title },
            format_score(movement.before_score),
            format_score(movement.after_score)
        ));
        if columns.cross_encoder {
            out.push_str(&format!(" {:>8}", format_optional_score(after.scores.cross_encoder)));
        }
        if columns.metadata_boost {
            out.push_str(&format!(" {:>8}", format_optional_score(after.scores.metadata_boost)));
        }
        out.push_str(&format!(
            " {:>6} {:>8}\n",
            movement_arrow(movement.delta_position),
            format!("{:+.3}", movement.delta_score)
        ));
    }

    out.push_str(&format!(
        "\n{} of {} results moved\n",
        comparison.moved_count(),
        comparison.movements.len()
    ));
    out
}

fn movement_arrow(delta: i64) -> String {
    match delta {
        d if d > 0 => format!("↑{}", d),
        d if d < 0 => format!("↓{}", -d),
        _ => "=".to_string(),
    }
}

/// Collection statistics from `GET /stats`
pub fn render_stats(stats: &StatsResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!("Collections: {}\n", stats.collections));
    out.push_str(&format!("Chunks: {}\n", stats.chunks));
    out.push_str(&format!(
        "Last ingest: {}\n",
        stats.last_ingest_at.as_deref().unwrap_or(MISSING)
    ));
    out.push_str(&format!(
        "Embedding model: {}\n",
        stats.embedding_model.as_deref().unwrap_or(MISSING)
    ));
    out.push_str(&format!(
        "Cross-encoder model: {}\n",
        stats.cross_encoder_model.as_deref().unwrap_or(MISSING)
    ));
    out.push_str(&format!(
        "Vector dims: {}\n",
        stats
            .pgvector_dims
            .map_or_else(|| MISSING.to_string(), |d| d.to_string())
    ));
    out
}

/// Available filter values from `GET /facets`
pub fn render_facets(facets: &FacetsResponse) -> String {
    fn list(values: &[String]) -> String {
        if values.is_empty() {
            MISSING.to_string()
        } else {
            values.join(", ")
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Component types: {}\n", list(&facets.component_types)));
    out.push_str(&format!("Tags: {}\n", list(&facets.tags)));
    out.push_str(&format!("Sources: {}\n", list(&facets.sources)));
    out.push_str(&format!(
        "Date range: {} .. {}\n",
        facets.date_range.min.as_deref().unwrap_or(MISSING),
        facets.date_range.max.as_deref().unwrap_or(MISSING)
    ));
    out
}

/// Saved presets, one per line
pub fn render_presets(presets: &[ExperimentPreset]) -> String {
    if presets.is_empty() {
        return "No presets saved\n".to_string();
    }

    let mut out = String::new();
    for preset in presets {
        let short_id: String = preset.id.chars().take(8).collect();
        out.push_str(&format!(
            "{}  {:<20} '{}' top_k={} rerank={} hybrid={}",
            short_id,
            preset.name,
            preset.parameters.query,
            preset.parameters.top_k,
            if preset.parameters.rerank.enabled { "on" } else { "off" },
            if preset.parameters.hybrid.lexical { "on" } else { "off" },
        ));
        if let Some(last_used) = preset.last_used {
            out.push_str(&format!(" (used {})", last_used.format("%Y-%m-%d %H:%M")));
        }
        out.push('\n');
        if let Some(description) = preset.description.as_deref() {
            out.push_str(&format!("          {}\n", description));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SearchResult;

    #[test]
    fn test_movement_arrow() {
        assert_eq!(movement_arrow(2), "↑2");
        assert_eq!(movement_arrow(-1), "↓1");
        assert_eq!(movement_arrow(0), "=");
    }

    #[test]
    fn test_empty_comparison() {
        let comparison = RerankComparison::from_results(&[]);
        assert_eq!(
            render_comparison(&comparison, ComparisonColumns::default()),
            "No results to compare\n"
        );
    }

    #[test]
    fn test_comparison_optional_columns() {
        let mut result = SearchResult::new("a", "", 0.9)
            .with_title("Order mapping")
            .with_vector_score(0.6);
        result.scores.cross_encoder = Some(0.8);
        let comparison = RerankComparison::from_results(&[result]);

        let plain = render_comparison(&comparison, ComparisonColumns::default());
        assert!(!plain.contains("Cross"));
        assert!(plain.contains("Order mapping"));
        assert!(plain.contains("+0.300"));
        assert!(plain.contains("0 of 1 results moved"));

        let with_cross = render_comparison(
            &comparison,
            ComparisonColumns {
                cross_encoder: true,
                metadata_boost: true,
            },
        );
        assert!(with_cross.contains("Cross"));
        assert!(with_cross.contains("0.800"));
    }

    #[test]
    fn test_render_stats_missing_fields() {
        let stats = StatsResponse {
            collections: 2,
            chunks: 120,
            ..StatsResponse::default()
        };
        let text = render_stats(&stats);
        assert!(text.contains("Chunks: 120"));
        assert!(text.contains("Embedding model: -"));
        assert!(text.contains("Vector dims: -"));
    }

    #[test]
    fn test_render_presets() {
        assert_eq!(render_presets(&[]), "No presets saved\n");

        let mut store = crate::state::PresetStore::new();
        let state = crate::state::SearchState {
            query: "order mapping".to_string(),
            ..crate::state::SearchState::default()
        };
        store.add("baseline", Some("no rerank"), state).unwrap();
        let text = render_presets(store.list());
        assert!(text.contains("baseline"));
        assert!(text.contains("'order mapping' top_k=10 rerank=off hybrid=off"));
        assert!(text.contains("no rerank"));
    }

    #[test]
    fn test_render_facets() {
        let facets = FacetsResponse {
            component_types: vec!["Groovy".to_string(), "XSLT".to_string()],
            ..FacetsResponse::default()
        };
        let text = render_facets(&facets);
        assert!(text.contains("Component types: Groovy, XSLT"));
        assert!(text.contains("Tags: -"));
    }
}
