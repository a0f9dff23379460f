//! ragconsole: Testing console for RAG backends
//!
//! This library drives an external retrieval-augmented-generation backend
//! over HTTP and keeps the state an operator needs while tuning it: the
//! current search parameters, the last result set, a session query log and
//! saved experiment presets.
//!
//! # Features
//!
//! - Plain and agentic search with automatic agentic-to-plain fallback
//! - Debounced live search
//! - Before/after re-rank comparison with CSV export
//! - Code generation from selected search results
//! - Session query log with latency and error-rate metrics
//! - Experiment presets persisted as JSON
//!
//! # Modules
//!
//! - `config`: Application settings, score weights and path resolution
//! - `api`: Wire types and the backend HTTP client
//! - `state`: Search parameters, the shared store, query log and presets
//! - `search`: Dispatcher with fallback chain and the live-search trigger
//! - `rerank`: Before/after comparator and CSV export
//! - `render`: Terminal rendering of results, tables and scores
//! - `generate`: Context selection and code generation
//! - `console`: Interactive line-oriented console

pub mod api;
pub mod config;
pub mod console;
pub mod generate;
pub mod render;
pub mod rerank;
pub mod search;
pub mod state;

// Re-export commonly used types
pub use api::{ApiError, RagApiClient, SearchResult};
pub use config::{AppConfig, SearchMode, WeightVector};
pub use search::{DispatchError, Dispatcher, LiveSearch};
pub use state::{AppStore, SearchState, SearchStatePatch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
