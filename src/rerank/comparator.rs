//! Before/after comparator
//!
//! The "before" view keeps the input order and substitutes each item's vector
//! score (0 when absent) for its final score. It is deliberately not
//! re-sorted: position i+1 in the before view is simply index i of the input.
//! The input list itself is never mutated.

use serde::{Deserialize, Serialize};

use crate::api::SearchResult;

/// Rank and score movement of one result between the two views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: String,
    pub before_position: usize,
    pub after_position: usize,
    pub before_score: f64,
    pub after_score: f64,
    /// before_position - after_position; positive means the item moved up
    pub delta_position: i64,
    /// after_score - before_score
    pub delta_score: f64,
}

/// Parallel before/after views of one result set
#[derive(Debug, Clone, PartialEq)]
pub struct RerankComparison {
    pub before: Vec<SearchResult>,
    pub after: Vec<SearchResult>,
    pub movements: Vec<Movement>,
}

impl RerankComparison {
    /// Build the comparison from the current (final-score ordered) results
    pub fn from_results(results: &[SearchResult]) -> Self {
        let before: Vec<SearchResult> = results
            .iter()
            .map(|result| {
                let mut derived = result.clone();
                derived.scores.final_score = result.scores.vector.unwrap_or(0.0);
                derived
            })
            .collect();
        let after = results.to_vec();

        let movements = before
            .iter()
            .zip(after.iter())
            .enumerate()
            .map(|(index, (before_item, after_item))| {
                let before_position = index + 1;
                // first match wins when ids repeat
                let after_position = after
                    .iter()
                    .position(|r| r.id == before_item.id)
                    .map_or(0, |i| i + 1);

                Movement {
                    id: before_item.id.clone(),
                    before_position,
                    after_position,
                    before_score: before_item.scores.final_score,
                    after_score: after_item.scores.final_score,
                    delta_position: before_position as i64 - after_position as i64,
                    delta_score: after_item.scores.final_score - before_item.scores.final_score,
                }
            })
            .collect();

        Self {
            before,
            after,
            movements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_empty()
    }

    /// Title shown for `id` in the before view ("" when absent)
    pub fn title_for(&self, id: &str) -> &str {
        self.before
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.title.as_deref())
            .unwrap_or("")
    }

    /// Movement table as delimited text
    pub fn to_csv(&self) -> String {
        super::movements_to_csv(&self.movements, |id| self.title_for(id).to_string())
    }

    /// Number of items whose position differs between the views
    pub fn moved_count(&self) -> usize {
        self.movements
            .iter()
            .filter(|m| m.delta_position != 0)
            .count()
    }
}
