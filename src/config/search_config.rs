//! Search mode and score-weight settings
//!
//! Defines which backend endpoint a dispatch targets and the rerank weight
//! vector exposed by the score-weight sliders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which search endpoint a dispatch targets first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Plain vector/hybrid search (`POST /search`)
    #[default]
    Plain,
    /// Knowledge-graph-enhanced search (`POST /search/agentic`), falling back to plain
    Agentic,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Plain => "plain",
            SearchMode::Agentic => "agentic",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "search" => Ok(SearchMode::Plain),
            "agentic" | "kg" => Ok(SearchMode::Agentic),
            other => Err(format!(
                "Invalid search mode '{}'. Valid modes: plain, agentic",
                other
            )),
        }
    }
}

/// Slider step for the score weights
pub const WEIGHT_STEP: f64 = 0.1;

/// Rerank weight vector (dense / cross-encoder / metadata)
///
/// The three weights are independent: nothing forces them to sum to 1, the
/// backend decides how to normalise them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub dense: f64,
    pub cross: f64,
    pub meta: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            dense: 0.7,
            cross: 0.2,
            meta: 0.1,
        }
    }
}

impl WeightVector {
    /// Build a weight vector, snapping every component to the slider grid
    pub fn new(dense: f64, cross: f64, meta: f64) -> Self {
        Self {
            dense: Self::snap(dense),
            cross: Self::snap(cross),
            meta: Self::snap(meta),
        }
    }

    /// Clamp to [0, 1] and round to the nearest 0.1 step
    pub fn snap(value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        let clamped = value.clamp(0.0, 1.0);
        let steps = 1.0 / WEIGHT_STEP;
        (clamped * steps).round() / steps
    }

    pub fn with_dense(mut self, value: f64) -> Self {
        self.dense = Self::snap(value);
        self
    }

    pub fn with_cross(mut self, value: f64) -> Self {
        self.cross = Self::snap(value);
        self
    }

    pub fn with_meta(mut self, value: f64) -> Self {
        self.meta = Self::snap(value);
        self
    }

    /// Whether every component lies within [0, 1]
    pub fn is_valid(&self) -> bool {
        [self.dense, self.cross, self.meta]
            .iter()
            .all(|w| (0.0..=1.0).contains(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_mode_default() {
        assert_eq!(SearchMode::default(), SearchMode::Plain);
    }

    #[test]
    fn test_search_mode_serialization() {
        let json = serde_json::to_string(&SearchMode::Agentic).unwrap();
        assert_eq!(json, "\"agentic\"");

        let deserialized: SearchMode = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, SearchMode::Agentic);
    }

    #[test]
    fn test_search_mode_from_str() {
        assert_eq!("Agentic".parse::<SearchMode>(), Ok(SearchMode::Agentic));
        assert_eq!("plain".parse::<SearchMode>(), Ok(SearchMode::Plain));
        assert!("bm25".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_weight_defaults() {
        let weights = WeightVector::default();
        assert_eq!(weights.dense, 0.7);
        assert_eq!(weights.cross, 0.2);
        assert_eq!(weights.meta, 0.1);
    }

    #[test]
    fn test_weight_snap_clamps_and_rounds() {
        assert_eq!(WeightVector::snap(1.7), 1.0);
        assert_eq!(WeightVector::snap(-0.3), 0.0);
        assert!((WeightVector::snap(0.44) - 0.4).abs() < 1e-9);
        assert!((WeightVector::snap(0.46) - 0.5).abs() < 1e-9);
        assert_eq!(WeightVector::snap(f64::NAN), 0.0);
    }

    #[test]
    fn test_weights_are_independent() {
        let weights = WeightVector::new(1.0, 1.0, 1.0);
        assert!(weights.is_valid());
        assert!((weights.dense + weights.cross + weights.meta - 3.0).abs() < 1e-9);
    }
}
