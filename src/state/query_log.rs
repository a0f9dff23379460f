//! Query log and session metrics
//!
//! Provides:
//! - An append-only record of every dispatched query
//! - Success/error rates
//! - Latency averages over the most recent queries
//! - The dashboard text report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SearchState;
use crate::config::SearchMode;

/// How many entries the dashboard treats as "recent"
pub const RECENT_WINDOW: usize = 10;

/// Immutable record of one dispatched query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    /// Full parameter snapshot at dispatch time
    pub parameters: SearchState,
    pub results_count: usize,
    pub elapsed_ms: f64,
    pub success: bool,
    /// Endpoint that produced (or failed to produce) the outcome
    pub path: SearchMode,
}

impl QueryLogEntry {
    /// Entry for a dispatch that returned results
    pub fn success(
        parameters: &SearchState,
        path: SearchMode,
        results_count: usize,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: parameters.query.clone(),
            parameters: parameters.clone(),
            results_count,
            elapsed_ms,
            success: true,
            path,
        }
    }

    /// Entry for a dispatch that failed on every path (empty results, 0ms)
    pub fn failure(parameters: &SearchState, path: SearchMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: parameters.query.clone(),
            parameters: parameters.clone(),
            results_count: 0,
            elapsed_ms: 0.0,
            success: false,
            path,
        }
    }
}

/// Dashboard KPIs for the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub total_queries: usize,
    pub successful_queries: usize,
    /// Percentage of failed queries
    pub error_rate: f64,
    /// Average latency over the most recent queries
    pub avg_latency_ms: f64,
    /// Median latency over the whole session
    pub median_latency_ms: f64,
}

impl SessionMetrics {
    /// Success rate as percentage (100% for an empty session)
    pub fn success_rate(&self) -> f64 {
        100.0 - self.error_rate
    }
}

/// Append-only log of queries issued in this session
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    entries: Vec<QueryLogEntry>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn append(&mut self, entry: QueryLogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry
    pub fn last(&self) -> Option<&QueryLogEntry> {
        self.entries.last()
    }

    /// Up to `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<&QueryLogEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[QueryLogEntry] {
        &self.entries
    }

    /// Compute the session KPIs
    pub fn metrics(&self) -> SessionMetrics {
        let total_queries = self.entries.len();
        let successful_queries = self.entries.iter().filter(|e| e.success).count();
        let error_rate = if total_queries > 0 {
            ((total_queries - successful_queries) as f64 / total_queries as f64) * 100.0
        } else {
            0.0
        };

        let recent = self.recent(RECENT_WINDOW);
        let avg_latency_ms = if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|e| e.elapsed_ms).sum::<f64>() / recent.len() as f64
        };

        let mut latencies: Vec<f64> = self.entries.iter().map(|e| e.elapsed_ms).collect();
        latencies.sort_by(|a, b| a.total_cmp(b));
        let median_latency_ms = match latencies.len() {
            0 => 0.0,
            n if n % 2 == 1 => latencies[n / 2],
            n => (latencies[n / 2 - 1] + latencies[n / 2]) / 2.0,
        };

        SessionMetrics {
            total_queries,
            successful_queries,
            error_rate,
            avg_latency_ms,
            median_latency_ms,
        }
    }

    /// Generate the dashboard report
    pub fn report(&self, preset_count: usize) -> String {
        let metrics = self.metrics();

        let mut report = String::new();
        report.push_str("=== Testing Dashboard ===\n\n");

        report.push_str(&format!("Total Queries: {}\n", metrics.total_queries));
        report.push_str(&format!("Success Rate: {:.1}%\n", metrics.success_rate()));
        report.push_str(&format!("Avg Latency: {:.0}ms\n", metrics.avg_latency_ms));
        report.push_str(&format!("Median Latency: {:.0}ms\n", metrics.median_latency_ms));
        report.push_str(&format!("Experiments: {}\n", preset_count));

        if !self.entries.is_empty() {
            report.push_str("\nRecent Query Log:\n");
            for entry in self.recent(RECENT_WINDOW) {
                report.push_str(&format!(
                    "  {} {} [{}] {} • {} results • {:.0}ms\n",
                    if entry.success { "✓" } else { "✗" },
                    entry.query,
                    entry.path,
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.results_count,
                    entry.elapsed_ms
                ));
            }
        }

        report
    }
}
