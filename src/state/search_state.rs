//! Search state and partial-merge updates
//!
//! `SearchState` is only ever mutated by merging a `SearchStatePatch`; the
//! merge reports which fields actually changed so the live-search trigger can
//! tell qualifying edits (query, filters, rerank, hybrid) from the rest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::{HybridConfig, PaginationConfig, RerankConfig, SearchFilters, SearchRequest};
use crate::config::{AppConfig, WeightVector};

/// Client-side sort key for result views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    FinalScoreDesc,
    VectorScoreDesc,
    CrossEncoderScoreDesc,
    MetadataBoostDesc,
    CreatedAtDesc,
    SizeBytesDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 6] = [
        SortOption::FinalScoreDesc,
        SortOption::VectorScoreDesc,
        SortOption::CrossEncoderScoreDesc,
        SortOption::MetadataBoostDesc,
        SortOption::CreatedAtDesc,
        SortOption::SizeBytesDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::FinalScoreDesc => "final_score_desc",
            SortOption::VectorScoreDesc => "vector_score_desc",
            SortOption::CrossEncoderScoreDesc => "cross_encoder_score_desc",
            SortOption::MetadataBoostDesc => "metadata_boost_desc",
            SortOption::CreatedAtDesc => "created_at_desc",
            SortOption::SizeBytesDesc => "size_bytes_desc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|opt| opt.as_str() == needle)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|o| o.as_str()).collect();
                format!("Invalid sort key '{}'. Valid keys: {}", s, valid.join(", "))
            })
    }
}

/// Everything the operator has dialled in for the next search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub top_k: usize,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub hybrid: HybridConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub sort_by: SortOption,
    #[serde(default)]
    pub live_search: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 10,
            filters: SearchFilters::default(),
            rerank: RerankConfig {
                enabled: false,
                model: None,
                weight_vector: Some(WeightVector::default()),
            },
            hybrid: HybridConfig::default(),
            pagination: PaginationConfig::default(),
            sort_by: SortOption::default(),
            live_search: false,
        }
    }
}

impl SearchState {
    /// Initial state for a new session, seeded from persisted settings
    pub fn from_config(config: &AppConfig) -> Self {
        let toggles = config.default_toggles();
        Self {
            top_k: config.default_top_k(),
            rerank: RerankConfig {
                enabled: toggles.reranking,
                model: None,
                weight_vector: Some(config.default_weights()),
            },
            hybrid: HybridConfig {
                lexical: toggles.hybrid,
                ..HybridConfig::default()
            },
            pagination: PaginationConfig {
                page: 1,
                page_size: config.default_page_size(),
            },
            live_search: toggles.live_search,
            ..Self::default()
        }
    }

    /// Whether the query is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Request body for both search endpoints
    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            top_k: self.top_k,
            filters: self.filters.clone(),
            rerank: self.rerank.clone(),
            hybrid: self.hybrid.clone(),
            pagination: self.pagination,
        }
    }

    /// Effective rerank weights (defaults when none are set)
    pub fn weights(&self) -> WeightVector {
        self.rerank.weight_vector.unwrap_or_default()
    }

    /// Merge `patch` into this state and report what changed
    pub fn apply(&mut self, patch: SearchStatePatch) -> StateChange {
        let mut change = StateChange::default();

        if let Some(query) = patch.query {
            change.query = query != self.query;
            self.query = query;
        }
        if let Some(top_k) = patch.top_k {
            change.top_k = top_k != self.top_k;
            self.top_k = top_k;
        }
        if let Some(filters) = patch.filters {
            change.filters = filters != self.filters;
            self.filters = filters;
        }
        if let Some(mut rerank) = patch.rerank {
            if let Some(weights) = rerank.weight_vector {
                rerank.weight_vector =
                    Some(WeightVector::new(weights.dense, weights.cross, weights.meta));
            }
            change.rerank = rerank != self.rerank;
            self.rerank = rerank;
        }
        if let Some(mut hybrid) = patch.hybrid {
            hybrid.alpha = hybrid.alpha.map(clamp_alpha);
            change.hybrid = hybrid != self.hybrid;
            self.hybrid = hybrid;
        }
        if let Some(pagination) = patch.pagination {
            change.pagination = pagination != self.pagination;
            self.pagination = pagination;
        }
        if let Some(sort_by) = patch.sort_by {
            change.sort_by = sort_by != self.sort_by;
            self.sort_by = sort_by;
        }
        if let Some(live_search) = patch.live_search {
            change.live_search = live_search != self.live_search;
            self.live_search = live_search;
        }

        change
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStatePatch {
    pub query: Option<String>,
    pub top_k: Option<usize>,
    pub filters: Option<SearchFilters>,
    pub rerank: Option<RerankConfig>,
    pub hybrid: Option<HybridConfig>,
    pub pagination: Option<PaginationConfig>,
    pub sort_by: Option<SortOption>,
    pub live_search: Option<bool>,
}

impl SearchStatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn rerank(mut self, rerank: RerankConfig) -> Self {
        self.rerank = Some(rerank);
        self
    }

    pub fn hybrid(mut self, hybrid: HybridConfig) -> Self {
        self.hybrid = Some(hybrid);
        self
    }

    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn sort_by(mut self, sort_by: SortOption) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn live_search(mut self, live_search: bool) -> Self {
        self.live_search = Some(live_search);
        self
    }
}

/// Which fields a merge actually changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChange {
    pub query: bool,
    pub top_k: bool,
    pub filters: bool,
    pub rerank: bool,
    pub hybrid: bool,
    pub pagination: bool,
    pub sort_by: bool,
    pub live_search: bool,
}

impl StateChange {
    /// Edits that retrigger live search
    pub fn is_qualifying(&self) -> bool {
        self.query || self.filters || self.rerank || self.hybrid
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Change set for a wholesale replacement of `old` by `new`
    pub fn between(old: &SearchState, new: &SearchState) -> Self {
        Self {
            query: old.query != new.query,
            top_k: old.top_k != new.top_k,
            filters: old.filters != new.filters,
            rerank: old.rerank != new.rerank,
            hybrid: old.hybrid != new.hybrid,
            pagination: old.pagination != new.pagination,
            sort_by: old.sort_by != new.sort_by,
            live_search: old.live_search != new.live_search,
        }
    }
}

/// Blend factor in [0, 1]; NaN falls back to 0 like the weight sliders
fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = SearchState::default();
        assert!(state.is_blank());
        assert_eq!(state.top_k, 10);
        assert_eq!(state.pagination.page, 1);
        assert_eq!(state.sort_by, SortOption::FinalScoreDesc);
        assert!(!state.live_search);
    }

    #[test]
    fn test_whitespace_query_is_blank() {
        let state = SearchState {
            query: "  \t\n".to_string(),
            ..SearchState::default()
        };
        assert!(state.is_blank());
    }

    #[test]
    fn test_query_edit_is_qualifying() {
        let mut state = SearchState::default();
        let change = state.apply(SearchStatePatch::new().query("groovy mapping"));
        assert!(change.query);
        assert!(change.is_qualifying());
        assert_eq!(state.query, "groovy mapping");
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut state = SearchState::default();
        state.apply(SearchStatePatch::new().query("x"));
        let change = state.apply(SearchStatePatch::new().query("x"));
        assert!(change.is_empty());
    }

    #[test]
    fn test_pagination_and_sort_do_not_qualify() {
        let mut state = SearchState::default();
        let change = state.apply(
            SearchStatePatch::new()
                .pagination(PaginationConfig {
                    page: 3,
                    page_size: 10,
                })
                .sort_by(SortOption::SizeBytesDesc),
        );
        assert!(change.pagination);
        assert!(change.sort_by);
        assert!(!change.is_qualifying());
    }

    #[test]
    fn test_rerank_weights_are_snapped_on_merge() {
        let mut state = SearchState::default();
        let change = state.apply(SearchStatePatch::new().rerank(RerankConfig {
            enabled: true,
            model: None,
            weight_vector: Some(WeightVector {
                dense: 0.93,
                cross: 2.0,
                meta: 0.0,
            }),
        }));
        assert!(change.rerank);
        let weights = state.weights();
        assert!((weights.dense - 0.9).abs() < 1e-9);
        assert_eq!(weights.cross, 1.0);
    }

    #[test]
    fn test_hybrid_alpha_is_clamped() {
        let mut state = SearchState::default();
        state.apply(SearchStatePatch::new().hybrid(HybridConfig {
            lexical: true,
            alpha: Some(1.4),
        }));
        assert_eq!(state.hybrid.alpha, Some(1.0));
    }

    #[test]
    fn test_hybrid_alpha_nan_is_zeroed() {
        let mut state = SearchState::default();
        let patch = || {
            SearchStatePatch::new().hybrid(HybridConfig {
                lexical: true,
                alpha: Some(f64::NAN),
            })
        };
        assert!(state.apply(patch()).hybrid);
        assert_eq!(state.hybrid.alpha, Some(0.0));
        // repeating the edit is not a change
        assert!(!state.apply(patch()).hybrid);

        let body = serde_json::to_value(state.to_request()).unwrap();
        assert_eq!(body["hybrid"]["alpha"], 0.0);
    }

    #[test]
    fn test_to_request_copies_parameters() {
        let mut state = SearchState::default();
        state.apply(SearchStatePatch::new().query("wsdl").top_k(5));
        let request = state.to_request();
        assert_eq!(request.query, "wsdl");
        assert_eq!(request.top_k, 5);
        assert_eq!(request.pagination, state.pagination);
    }

    #[test]
    fn test_from_config_uses_settings() {
        let config = AppConfig::default().with_default_top_k(25);
        let state = SearchState::from_config(&config);
        assert_eq!(state.top_k, 25);
        assert_eq!(state.weights(), WeightVector::default());
    }

    #[test]
    fn test_sort_option_round_trip_names() {
        for option in SortOption::ALL {
            assert_eq!(option.as_str().parse::<SortOption>(), Ok(option));
        }
        assert!("random".parse::<SortOption>().is_err());
    }

    #[test]
    fn test_state_change_between() {
        let old = SearchState::default();
        let new = SearchState {
            live_search: true,
            ..SearchState::default()
        };
        let change = StateChange::between(&old, &new);
        assert!(change.live_search);
        assert!(!change.is_qualifying());
    }
}
