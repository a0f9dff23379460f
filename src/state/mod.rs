//! Application state module
//!
//! `AppStore` is the single process-wide store: current search parameters,
//! the last result set, loading/error flags, the query log and presets.
//! It is only mutated through the transition functions below; observers
//! subscribe to the events each transition emits.

mod presets;
mod query_log;
mod search_state;

pub use presets::{ExperimentPreset, PresetStore};
pub use query_log::{QueryLog, QueryLogEntry, SessionMetrics, RECENT_WINDOW};
pub use search_state::{SearchState, SearchStatePatch, SortOption, StateChange};

use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::{AgenticInfo, SearchResult, SearchStats};
use crate::config::AppConfig;

/// What to do with a response that arrives after a newer one was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Last writer wins, whatever order requests were issued in
    #[default]
    Apply,
    /// Drop responses older than the newest applied one
    Discard,
}

/// Identifies one dispatch for ordering purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Notifications delivered to observers after a transition
#[derive(Debug, Clone)]
pub enum StoreEvent {
    SearchStateChanged {
        change: StateChange,
        state: SearchState,
    },
    ResultsReplaced {
        ticket: SearchTicket,
        count: usize,
    },
    SearchFailed {
        ticket: SearchTicket,
        message: String,
    },
    QueryLogged(QueryLogEntry),
    PresetsChanged,
}

type Observer = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Debug, Default)]
struct StoreInner {
    search_state: SearchState,
    results: Vec<SearchResult>,
    stats: Option<SearchStats>,
    agentic_info: Option<AgenticInfo>,
    in_flight: usize,
    error: Option<String>,
    query_log: QueryLog,
    presets: PresetStore,
    next_ticket: u64,
    applied_ticket: Option<SearchTicket>,
    stale_policy: StalePolicy,
}

impl StoreInner {
    fn is_stale(&self, ticket: SearchTicket) -> bool {
        self.stale_policy == StalePolicy::Discard
            && self.applied_ticket.is_some_and(|applied| ticket < applied)
    }
}

/// Shared handle to the application store
#[derive(Clone, Default)]
pub struct AppStore {
    inner: Arc<RwLock<StoreInner>>,
    observers: Arc<RwLock<Vec<(SubscriptionId, Observer)>>>,
    next_subscription: Arc<AtomicU64>,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("inner", &*self.inner.read())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

impl AppStore {
    /// Create a store with default search state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from persisted settings
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            inner.search_state = SearchState::from_config(config);
            inner.stale_policy = if config.discard_stale_responses() {
                StalePolicy::Discard
            } else {
                StalePolicy::Apply
            };
        }
        store
    }

    pub fn with_stale_policy(self, policy: StalePolicy) -> Self {
        self.inner.write().stale_policy = policy;
        self
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a callback invoked after every transition
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, Arc::new(observer)));
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    fn notify(&self, event: StoreEvent) {
        let observers: Vec<Observer> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(&event);
        }
    }

    // =========================================================================
    // Search state transitions
    // =========================================================================

    /// Merge a partial update into the search state
    pub fn update_search_state(&self, patch: SearchStatePatch) -> StateChange {
        let (change, state) = {
            let mut inner = self.inner.write();
            let change = inner.search_state.apply(patch);
            (change, inner.search_state.clone())
        };
        if !change.is_empty() {
            self.notify(StoreEvent::SearchStateChanged { change, state });
        }
        change
    }

    /// Replace the search state wholesale (e.g. when loading a preset)
    pub fn replace_search_state(&self, state: SearchState) -> StateChange {
        let change = {
            let mut inner = self.inner.write();
            let change = StateChange::between(&inner.search_state, &state);
            inner.search_state = state.clone();
            change
        };
        if !change.is_empty() {
            self.notify(StoreEvent::SearchStateChanged { change, state });
        }
        change
    }

    pub fn search_state(&self) -> SearchState {
        self.inner.read().search_state.clone()
    }

    // =========================================================================
    // Dispatch lifecycle
    // =========================================================================

    /// Mark a dispatch as in flight and clear the previous error
    pub fn begin_search(&self) -> SearchTicket {
        let mut inner = self.inner.write();
        inner.next_ticket += 1;
        inner.in_flight += 1;
        inner.error = None;
        SearchTicket(inner.next_ticket)
    }

    /// Replace the result set; returns false when the response was discarded as stale
    pub fn apply_results(
        &self,
        ticket: SearchTicket,
        results: Vec<SearchResult>,
        stats: SearchStats,
        agentic_info: Option<AgenticInfo>,
    ) -> bool {
        let count = results.len();
        {
            let mut inner = self.inner.write();
            if inner.is_stale(ticket) {
                tracing::debug!("Discarding stale response for ticket {}", ticket.0);
                return false;
            }
            inner.results = results;
            inner.stats = Some(stats);
            inner.agentic_info = agentic_info;
            inner.error = None;
            inner.applied_ticket = Some(inner.applied_ticket.map_or(ticket, |t| t.max(ticket)));
        }
        self.notify(StoreEvent::ResultsReplaced { ticket, count });
        true
    }

    /// Record a user-visible error for a dispatch
    pub fn fail_search(&self, ticket: SearchTicket, message: impl Into<String>) -> bool {
        let message = message.into();
        {
            let mut inner = self.inner.write();
            if inner.is_stale(ticket) {
                return false;
            }
            inner.error = Some(message.clone());
        }
        self.notify(StoreEvent::SearchFailed { ticket, message });
        true
    }

    /// Mark a dispatch as complete
    pub fn finish_search(&self, _ticket: SearchTicket) {
        let mut inner = self.inner.write();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().in_flight > 0
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.inner.read().results.clone()
    }

    pub fn stats(&self) -> Option<SearchStats> {
        self.inner.read().stats
    }

    pub fn agentic_info(&self) -> Option<AgenticInfo> {
        self.inner.read().agentic_info.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().error.clone()
    }

    // =========================================================================
    // Query log
    // =========================================================================

    pub fn add_query_log_entry(&self, entry: QueryLogEntry) {
        self.inner.write().query_log.append(entry.clone());
        self.notify(StoreEvent::QueryLogged(entry));
    }

    pub fn query_log(&self) -> Vec<QueryLogEntry> {
        self.inner.read().query_log.entries().to_vec()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.inner.read().query_log.metrics()
    }

    pub fn dashboard_report(&self) -> String {
        let inner = self.inner.read();
        inner.query_log.report(inner.presets.len())
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Replace the preset collection (session start)
    pub fn set_presets(&self, presets: PresetStore) {
        self.inner.write().presets = presets;
        self.notify(StoreEvent::PresetsChanged);
    }

    pub fn presets(&self) -> Vec<ExperimentPreset> {
        self.inner.read().presets.list().to_vec()
    }

    /// Save the current search state as a preset
    pub fn save_preset(&self, name: &str, description: Option<&str>) -> Result<ExperimentPreset> {
        let preset = {
            let mut inner = self.inner.write();
            let state = inner.search_state.clone();
            inner.presets.add(name, description, state)?.clone()
        };
        self.notify(StoreEvent::PresetsChanged);
        Ok(preset)
    }

    /// Save the newest logged query's parameters as a preset
    pub fn save_preset_from_last_query(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ExperimentPreset> {
        let preset = {
            let mut guard = self.inner.write();
            let inner = &mut *guard;
            inner
                .presets
                .add_from_last_query(name, description, &inner.query_log)?
                .clone()
        };
        self.notify(StoreEvent::PresetsChanged);
        Ok(preset)
    }

    /// Remove a preset by id, id prefix or name
    pub fn remove_preset(&self, key: &str) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            match inner.presets.find(key).map(|p| p.id.clone()) {
                Some(id) => inner.presets.remove(&id),
                None => false,
            }
        };
        if removed {
            self.notify(StoreEvent::PresetsChanged);
        }
        removed
    }

    /// Load a preset (by id, id prefix or name) into the search state
    pub fn load_preset(&self, key: &str) -> Result<StateChange> {
        let state = {
            let mut inner = self.inner.write();
            let id = inner
                .presets
                .find(key)
                .map(|p| p.id.clone())
                .ok_or_else(|| anyhow!("No preset matches '{}'", key))?;
            inner
                .presets
                .mark_used(&id)
                .ok_or_else(|| anyhow!("Preset '{}' disappeared", id))?
        };
        self.notify(StoreEvent::PresetsChanged);
        Ok(self.replace_search_state(state))
    }

    pub fn save_presets(&self, path: &Path) -> Result<()> {
        self.inner.read().presets.save(path)
    }
}
