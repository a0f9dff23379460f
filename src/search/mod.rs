//! Search module
//!
//! This module issues searches against the backend (with agentic-to-plain
//! fallback) and drives debounced live search.

mod dispatcher;
mod live;

pub use dispatcher::{DispatchError, DispatchOutcome, Dispatcher};
pub use live::{LiveDispatch, LiveSearch, LiveTarget, DEFAULT_DEBOUNCE};
