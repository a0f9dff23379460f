//! Search dispatcher
//!
//! Turns the current `SearchState` into one backend call chain:
//! agentic first (when selected) and plain as the fallback, each attempted at
//! most once. Every non-blank dispatch appends exactly one query-log entry.

use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiError, RagApiClient, SearchResponse, SearchStats};
use crate::config::SearchMode;
use crate::state::{AppStore, QueryLogEntry, SearchState};

/// Both attempts of a dispatch failed
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DispatchError {
    message: String,
    /// Error from the agentic attempt, when one was made
    pub agentic: Option<ApiError>,
    /// Error from the plain attempt (the terminal one)
    #[source]
    pub plain: ApiError,
}

impl DispatchError {
    pub fn new(agentic: Option<ApiError>, plain: ApiError) -> Self {
        let message = match &agentic {
            Some(agentic) => format!(
                "Agentic search failed ({}); fallback search failed: {}",
                agentic, plain
            ),
            None => plain.to_string(),
        };
        Self {
            message,
            agentic,
            plain,
        }
    }

    /// User-visible message for the error banner
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Summary of a dispatch that produced results
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Endpoint that produced the results
    pub path: SearchMode,
    /// Whether the agentic attempt failed and plain search answered
    pub fell_back: bool,
    pub results_count: usize,
    pub stats: SearchStats,
    /// False when the store discarded the response as stale
    pub applied: bool,
}

/// Issues searches against the backend and records the outcome in the store
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<RagApiClient>,
    store: AppStore,
}

impl Dispatcher {
    pub fn new(client: Arc<RagApiClient>, store: AppStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn client(&self) -> &RagApiClient {
        &self.client
    }

    /// Dispatch the store's current search state
    ///
    /// Returns `Ok(None)` without touching the network or the log when the
    /// query is blank.
    pub async fn dispatch(
        &self,
        mode: SearchMode,
    ) -> Result<Option<DispatchOutcome>, DispatchError> {
        let state = self.store.search_state();
        self.dispatch_state(state, mode).await
    }

    /// Dispatch an explicit parameter snapshot
    pub async fn dispatch_state(
        &self,
        state: SearchState,
        mode: SearchMode,
    ) -> Result<Option<DispatchOutcome>, DispatchError> {
        if state.is_blank() {
            tracing::debug!("Skipping dispatch for blank query");
            return Ok(None);
        }

        let ticket = self.store.begin_search();
        let result = self.run_chain(&state, mode).await;

        let outcome = match result {
            Ok((path, fell_back, response)) => {
                let stats = match path {
                    SearchMode::Agentic => response.agentic_stats(),
                    SearchMode::Plain => response.plain_stats(),
                };
                let results_count = response.results.len();
                tracing::info!(
                    "Search '{}' via {} returned {} results in {:.0}ms",
                    state.query,
                    path,
                    results_count,
                    stats.elapsed_ms
                );

                let applied = self.store.apply_results(
                    ticket,
                    response.results,
                    stats,
                    response.agentic_info,
                );
                self.store.add_query_log_entry(QueryLogEntry::success(
                    &state,
                    path,
                    results_count,
                    stats.elapsed_ms,
                ));

                Ok(Some(DispatchOutcome {
                    path,
                    fell_back,
                    results_count,
                    stats,
                    applied,
                }))
            }
            Err(err) => {
                tracing::warn!("Search '{}' failed: {}", state.query, err);
                self.store.fail_search(ticket, err.message());
                self.store
                    .add_query_log_entry(QueryLogEntry::failure(&state, SearchMode::Plain));
                Err(err)
            }
        };

        self.store.finish_search(ticket);
        outcome
    }

    async fn run_chain(
        &self,
        state: &SearchState,
        mode: SearchMode,
    ) -> Result<(SearchMode, bool, SearchResponse), DispatchError> {
        let request = state.to_request();

        let agentic_error = match mode {
            SearchMode::Agentic => match self.client.agentic_search(&request).await {
                Ok(response) => return Ok((SearchMode::Agentic, false, response)),
                Err(e) => {
                    tracing::warn!("Agentic search failed, falling back to plain search: {}", e);
                    Some(e)
                }
            },
            SearchMode::Plain => None,
        };

        let fell_back = agentic_error.is_some();
        match self.client.search(&request).await {
            Ok(response) => Ok((SearchMode::Plain, fell_back, response)),
            Err(plain) => Err(DispatchError::new(agentic_error, plain)),
        }
    }
}
