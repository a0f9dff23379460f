//! Terminal rendering
//!
//! Pure functions turning store data into text. Nothing here mutates the
//! store; client-side sorting always produces a derived copy.

mod card;
mod table;

use std::cmp::Ordering;

pub use card::{render_card, render_enrichments, render_results, render_score_breakdown};
pub use table::{
    render_comparison, render_facets, render_presets, render_stats, ComparisonColumns,
};

use crate::api::SearchResult;
use crate::state::SortOption;

/// Placeholder for absent optional scores
pub const MISSING: &str = "-";

/// Summary percentage: 0.1234 -> "12.3%"
pub fn format_percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Detail score: 0.1234 -> "0.123"
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

/// Detail score or "-" when absent
pub fn format_optional_score(score: Option<f64>) -> String {
    score.map_or_else(|| MISSING.to_string(), format_score)
}

/// Summary percentage or "-" when absent
pub fn format_optional_percent(score: Option<f64>) -> String {
    score.map_or_else(|| MISSING.to_string(), format_percent)
}

/// Return a sorted copy of `results`; missing values sort last
pub fn sort_results(results: &[SearchResult], sort_by: SortOption) -> Vec<SearchResult> {
    let mut sorted = results.to_vec();
    match sort_by {
        SortOption::FinalScoreDesc => {
            sorted.sort_by(|a, b| desc(Some(a.scores.final_score), Some(b.scores.final_score)))
        }
        SortOption::VectorScoreDesc => sorted.sort_by(|a, b| desc(a.scores.vector, b.scores.vector)),
        SortOption::CrossEncoderScoreDesc => {
            sorted.sort_by(|a, b| desc(a.scores.cross_encoder, b.scores.cross_encoder))
        }
        SortOption::MetadataBoostDesc => {
            sorted.sort_by(|a, b| desc(a.scores.metadata_boost, b.scores.metadata_boost))
        }
        SortOption::CreatedAtDesc => sorted.sort_by(|a, b| {
            desc(
                a.metadata.created_at.as_deref(),
                b.metadata.created_at.as_deref(),
            )
        }),
        SortOption::SizeBytesDesc => {
            sorted.sort_by(|a, b| desc(a.metadata.size_bytes, b.metadata.size_bytes))
        }
    }
    sorted
}

fn desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
