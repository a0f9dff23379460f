//! Backend API module
//!
//! Wire types and the HTTP client for the external RAG service.

pub mod client;
pub mod types;

pub use client::{ApiError, RagApiClient};
pub use types::{
    AgenticInfo, ComponentType, FacetsResponse, GenerateRequest, GenerateResponse,
    HealthResponse, HybridConfig, KnowledgeGraphResult, PaginationConfig, RerankConfig,
    ResultMetadata, Scores, SearchFilters, SearchRequest, SearchResponse, SearchResult,
    SearchStats, SourceBreakdown, StatsResponse, WebSearchResult,
};
