//! Wire types for the RAG backend's JSON-over-HTTP contracts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::config::WeightVector;

// =============================================================================
// Request Types
// =============================================================================

/// Facet predicates applied by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_types: Vec<ComponentType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Re-ranking configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RerankConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_vector: Option<WeightVector>,
}

/// Hybrid (lexical + vector) blend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Whether lexical matching is blended in
    pub lexical: bool,
    /// Lexical/vector blend factor in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            lexical: false,
            alpha: Some(0.5),
        }
    }
}

/// Pagination (1-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

/// Body shared by `POST /search` and `POST /search/agentic`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: usize,
    pub filters: SearchFilters,
    pub rerank: RerankConfig,
    pub hybrid: HybridConfig,
    pub pagination: PaginationConfig,
}

/// Body of `POST /generate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub query: String,
    pub selected_contents: Vec<String>,
    pub model_key: String,
    pub top_k: usize,
}

// =============================================================================
// Result Types
// =============================================================================

/// Integration component category reported in result metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Groovy,
    #[serde(rename = "WSDL")]
    Wsdl,
    #[serde(rename = "XSLT")]
    Xslt,
    #[serde(rename = "BPMN")]
    Bpmn,
    Properties,
    #[serde(rename = "XML")]
    Xml,
    #[serde(other)]
    Other,
}

impl ComponentType {
    pub const ALL: [ComponentType; 7] = [
        ComponentType::Groovy,
        ComponentType::Wsdl,
        ComponentType::Xslt,
        ComponentType::Bpmn,
        ComponentType::Properties,
        ComponentType::Xml,
        ComponentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Groovy => "Groovy",
            ComponentType::Wsdl => "WSDL",
            ComponentType::Xslt => "XSLT",
            ComponentType::Bpmn => "BPMN",
            ComponentType::Properties => "Properties",
            ComponentType::Xml => "XML",
            ComponentType::Other => "Other",
        }
    }

    /// Case-insensitive lookup; unknown names map to `Other`
    pub fn parse_lenient(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(ComponentType::Other)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document metadata bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

/// Relevance score bag; `final` is always present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_encoder: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_boost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid: Option<f64>,
    #[serde(rename = "final")]
    pub final_score: f64,
}

/// Knowledge-graph enrichment attached by the agentic endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraphResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub relationship_type: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

/// Web-search enrichment attached by the agentic endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub relevance_score: f64,
}

/// Contribution of each source to an agentic result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub vector: f64,
    pub kg: f64,
    pub web: f64,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    #[serde(default)]
    pub metadata: ResultMetadata,
    pub scores: Scores,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_components: Vec<KnowledgeGraphResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<KnowledgeGraphResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub integration_patterns: Vec<KnowledgeGraphResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_updates: Vec<WebSearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_breakdown: Option<SourceBreakdown>,
}

impl SearchResult {
    /// Create a bare result with only an id, snippet and final score
    pub fn new(id: impl Into<String>, snippet: impl Into<String>, final_score: f64) -> Self {
        Self {
            id: id.into(),
            title: None,
            snippet: snippet.into(),
            content_preview: None,
            metadata: ResultMetadata::default(),
            scores: Scores {
                final_score,
                ..Scores::default()
            },
            related_components: Vec::new(),
            dependencies: Vec::new(),
            integration_patterns: Vec::new(),
            web_updates: Vec::new(),
            latest_info: None,
            final_relevance_score: None,
            source_breakdown: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_vector_score(mut self, score: f64) -> Self {
        self.scores.vector = Some(score);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.metadata.file_name = Some(file_name.into());
        self
    }

    /// Title, else file name, else "Untitled"
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.metadata.file_name.as_deref().filter(|f| !f.is_empty()))
            .unwrap_or("Untitled")
    }

    /// Whether the agentic endpoint attached any enrichment
    pub fn has_enrichments(&self) -> bool {
        !self.related_components.is_empty()
            || !self.dependencies.is_empty()
            || !self.integration_patterns.is_empty()
            || !self.web_updates.is_empty()
            || self.latest_info.is_some()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Extra timing/volume info returned by the agentic endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgenticInfo {
    #[serde(default)]
    pub kg_enhancements_count: u64,
    #[serde(default)]
    pub web_enhancements_count: u64,
    #[serde(default)]
    pub total_sources_used: u64,
    #[serde(default)]
    pub enhancement_time_ms: f64,
}

/// Response of `POST /search` and `POST /search/agentic`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub elapsed_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agentic_info: Option<AgenticInfo>,
}

/// Summary numbers shown next to a result list
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total: u64,
    pub elapsed_ms: f64,
}

impl SearchResponse {
    /// Stats for a plain-search response
    pub fn plain_stats(&self) -> SearchStats {
        SearchStats {
            total: self.total.unwrap_or(self.results.len() as u64),
            elapsed_ms: self.elapsed_ms.unwrap_or(0.0),
        }
    }

    /// Stats for an agentic response: total is the returned count, time is the enhancement time
    pub fn agentic_stats(&self) -> SearchStats {
        SearchStats {
            total: self.results.len() as u64,
            elapsed_ms: self
                .agentic_info
                .as_ref()
                .map(|info| info.enhancement_time_ms)
                .unwrap_or(0.0),
        }
    }
}

/// Response of `POST /generate`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
}

/// Response of `GET /stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub collections: u64,
    #[serde(default)]
    pub chunks: u64,
    #[serde(default)]
    pub last_ingest_at: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub cross_encoder_model: Option<String>,
    #[serde(default)]
    pub pgvector_dims: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

/// Response of `GET /facets`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetsResponse {
    #[serde(default)]
    pub component_types: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub date_range: DateRange,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_result_parses_minimal_payload() {
        let result: SearchResult = serde_json::from_value(json!({
            "id": "r1",
            "snippet": "def main()",
            "metadata": {},
            "scores": {"final": 0.42}
        }))
        .unwrap();
        assert_eq!(result.id, "r1");
        assert_eq!(result.scores.final_score, 0.42);
        assert!(result.scores.vector.is_none());
        assert!(!result.has_enrichments());
    }

    #[test]
    fn test_search_result_missing_final_is_error() {
        let result = serde_json::from_value::<SearchResult>(json!({
            "id": "r1",
            "snippet": "x",
            "scores": {"vector": 0.3}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_component_type_unknown_maps_to_other() {
        let metadata: ResultMetadata =
            serde_json::from_value(json!({"component_type": "Java"})).unwrap();
        assert_eq!(metadata.component_type, Some(ComponentType::Other));

        let metadata: ResultMetadata =
            serde_json::from_value(json!({"component_type": "WSDL"})).unwrap();
        assert_eq!(metadata.component_type, Some(ComponentType::Wsdl));
    }

    #[test]
    fn test_component_type_parse_lenient() {
        assert_eq!(ComponentType::parse_lenient("xslt"), ComponentType::Xslt);
        assert_eq!(ComponentType::parse_lenient("cobol"), ComponentType::Other);
    }

    #[test]
    fn test_display_title_fallbacks() {
        let titled = SearchResult::new("a", "", 0.1).with_title("Mapping");
        assert_eq!(titled.display_title(), "Mapping");

        let file_only = SearchResult::new("b", "", 0.1).with_file_name("flow.xsl");
        assert_eq!(file_only.display_title(), "flow.xsl");

        let bare = SearchResult::new("c", "", 0.1);
        assert_eq!(bare.display_title(), "Untitled");
    }

    #[test]
    fn test_empty_filters_are_omitted() {
        let body = serde_json::to_value(SearchFilters::default()).unwrap();
        assert_eq!(body, json!({}));
    }

    #[test]
    fn test_agentic_stats_without_info() {
        let response = SearchResponse {
            results: vec![SearchResult::new("a", "", 0.5)],
            ..SearchResponse::default()
        };
        let stats = response.agentic_stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.elapsed_ms, 0.0);
    }

    #[test]
    fn test_agentic_enrichments_parse() {
        let result: SearchResult = serde_json::from_value(json!({
            "id": "r1",
            "snippet": "x",
            "scores": {"final": 0.9},
            "related_components": [{
                "name": "OrderMapping",
                "type": "XSLT",
                "description": "maps orders",
                "relationship_type": "USES",
                "distance": 1
            }]
        }))
        .unwrap();
        assert!(result.has_enrichments());
        assert_eq!(result.related_components[0].kind, "XSLT");
    }
}
