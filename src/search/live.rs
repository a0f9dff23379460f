//! Live-search debounce trigger
//!
//! States: idle -> pending(deadline) -> idle. A qualifying edit with live
//! search on and a non-blank query (re)schedules the deadline, and so does
//! switching live search on; when the deadline passes the latest snapshot is
//! handed to the dispatch target. Turning live search off, or blanking the
//! query, cancels a pending fire. A dispatch that has already started is
//! never cancelled.

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::Dispatcher;
use crate::config::SearchMode;
use crate::state::{SearchState, StateChange};

/// Default quiet period before a live search fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Receiver of debounced dispatches
pub trait LiveTarget: Send + Sync + 'static {
    fn fire(&self, state: SearchState) -> impl Future<Output = ()> + Send;
}

/// Dispatcher usable as a live-search target
///
/// The mode is read when the search fires, so switching it keeps a pending
/// fire alive.
#[derive(Debug, Clone)]
pub struct LiveDispatch {
    dispatcher: Dispatcher,
    mode: Arc<RwLock<SearchMode>>,
}

impl LiveDispatch {
    pub fn new(dispatcher: Dispatcher, mode: SearchMode) -> Self {
        Self {
            dispatcher,
            mode: Arc::new(RwLock::new(mode)),
        }
    }

    pub fn mode(&self) -> SearchMode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: SearchMode) {
        *self.mode.write() = mode;
    }
}

impl LiveTarget for LiveDispatch {
    async fn fire(&self, state: SearchState) {
        let mode = self.mode();
        // failures are already recorded in the store and the query log
        if let Err(e) = self.dispatcher.dispatch_state(state, mode).await {
            tracing::debug!("Live search dispatch failed: {}", e);
        }
    }
}

/// Cancellable scheduled dispatch
pub struct LiveSearch<T: LiveTarget> {
    target: Arc<T>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<T: LiveTarget> LiveSearch<T> {
    /// Create a trigger with the default 400ms debounce
    pub fn new(target: Arc<T>) -> Self {
        Self::with_delay(target, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(target: Arc<T>, delay: Duration) -> Self {
        Self {
            target,
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Feed a store change; schedules, reschedules or cancels as needed
    ///
    /// Must be called from within a Tokio runtime.
    pub fn observe(&mut self, change: &StateChange, state: &SearchState) {
        if !state.live_search {
            if self.cancel() {
                tracing::debug!("Live search disabled, pending dispatch cancelled");
            }
            return;
        }

        if !change.is_qualifying() && !change.live_search {
            return;
        }

        if state.is_blank() {
            self.cancel();
            return;
        }

        self.schedule(state.clone());
    }

    fn schedule(&mut self, state: SearchState) {
        self.cancel();

        let target = Arc::clone(&self.target);
        let delay = self.delay;
        tracing::debug!("Live search scheduled for '{}' in {:?}", state.query, delay);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // detached so later edits cannot abort an in-flight request
            tokio::spawn(async move {
                target.fire(state).await;
            });
        }));
    }

    /// Cancel a pending dispatch; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a dispatch is scheduled but has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T: LiveTarget> Drop for LiveSearch<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SearchStatePatch;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        fired: Mutex<Vec<String>>,
    }

    impl LiveTarget for Recorder {
        async fn fire(&self, state: SearchState) {
            self.fired.lock().push(state.query);
        }
    }

    fn edit(state: &mut SearchState, patch: SearchStatePatch) -> StateChange {
        state.apply(patch)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_edit_fires_after_delay() {
        let recorder = Arc::new(Recorder::default());
        let mut live = LiveSearch::new(Arc::clone(&recorder));
        let mut state = SearchState {
            live_search: true,
            ..SearchState::default()
        };

        let change = edit(&mut state, SearchStatePatch::new().query("groovy"));
        live.observe(&change, &state);
        assert!(live.is_pending());

        tokio::time::sleep(Duration::from_millis(399)).await;
        assert!(recorder.fired.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*recorder.fired.lock(), vec!["groovy".to_string()]);
        assert!(!live.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_off_ignores_edits() {
        let recorder = Arc::new(Recorder::default());
        let mut live = LiveSearch::new(Arc::clone(&recorder));
        let mut state = SearchState::default();

        let change = edit(&mut state, SearchStatePatch::new().query("groovy"));
        live.observe(&change, &state);
        assert!(!live.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(recorder.fired.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_live_schedules_current_query() {
        let recorder = Arc::new(Recorder::default());
        let mut live = LiveSearch::new(Arc::clone(&recorder));
        let mut state = SearchState {
            query: "bpmn".to_string(),
            ..SearchState::default()
        };

        let change = edit(&mut state, SearchStatePatch::new().live_search(true));
        assert!(!change.is_qualifying());
        live.observe(&change, &state);
        assert!(live.is_pending());

        tokio::time::sleep(Duration::from_millis(410)).await;
        assert_eq!(*recorder.fired.lock(), vec!["bpmn".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_change_does_not_schedule() {
        let recorder = Arc::new(Recorder::default());
        let mut live = LiveSearch::new(Arc::clone(&recorder));
        let mut state = SearchState {
            query: "xslt".to_string(),
            live_search: true,
            ..SearchState::default()
        };

        let change = edit(
            &mut state,
            SearchStatePatch::new().sort_by(crate::state::SortOption::SizeBytesDesc),
        );
        live.observe(&change, &state);
        assert!(!live.is_pending());
    }
}
