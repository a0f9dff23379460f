//! Search dispatcher tests
//!
//! Fallback chain, query-log bookkeeping and store updates against a mock
//! backend.

use ragconsole::api::RagApiClient;
use ragconsole::config::SearchMode;
use ragconsole::search::Dispatcher;
use ragconsole::state::{AppStore, SearchStatePatch, StalePolicy, StoreEvent};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer) -> Dispatcher {
    let client = Arc::new(RagApiClient::new(server.uri()));
    Dispatcher::new(client, AppStore::new())
}

fn results_body(ids: &[&str]) -> serde_json::Value {
    let results: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "id": id,
                "snippet": "",
                "scores": {"vector": 0.5, "final": 1.0 - i as f64 * 0.1}
            })
        })
        .collect();
    json!({"results": results, "total": ids.len(), "elapsed_ms": 25.0})
}

#[tokio::test]
async fn test_plain_search_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let store = dispatcher.store().clone();
    store.update_search_state(SearchStatePatch::new().query("order mapping"));

    let outcome = dispatcher.dispatch(SearchMode::Plain).await.unwrap().unwrap();
    assert_eq!(outcome.path, SearchMode::Plain);
    assert!(!outcome.fell_back);
    assert_eq!(outcome.results_count, 2);

    assert_eq!(store.results().len(), 2);
    assert_eq!(store.stats().unwrap().total, 2);
    assert!(!store.is_loading());
    assert!(store.error().is_none());

    let log = store.query_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].success);
    assert_eq!(log[0].query, "order mapping");
    assert_eq!(log[0].results_count, 2);
    assert_eq!(log[0].elapsed_ms, 25.0);
    assert_eq!(log[0].path, SearchMode::Plain);
}

#[tokio::test]
async fn test_agentic_failure_falls_back_with_identical_body() {
    let server = MockServer::start().await;
    let dispatcher = dispatcher(&server);
    let store = dispatcher.store().clone();
    store.update_search_state(SearchStatePatch::new().query("xslt").top_k(5));

    let expected_body = serde_json::to_value(store.search_state().to_request()).unwrap();

    Mock::given(method("POST"))
        .and(path("/search/agentic"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "kg offline"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher.dispatch(SearchMode::Agentic).await.unwrap().unwrap();
    assert_eq!(outcome.path, SearchMode::Plain);
    assert!(outcome.fell_back);
    assert_eq!(store.results()[0].id, "x");
    assert!(store.error().is_none());

    let log = store.query_log();
    assert_eq!(log.len(), 1, "one log entry per dispatch");
    assert!(log[0].success);
    assert_eq!(log[0].path, SearchMode::Plain);
}

#[tokio::test]
async fn test_agentic_success_does_not_call_plain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/agentic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "k", "snippet": "", "scores": {"final": 0.9}}],
            "agentic_info": {"kg_enhancements_count": 2, "enhancement_time_ms": 300.0}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let store = dispatcher.store().clone();
    store.update_search_state(SearchStatePatch::new().query("orders"));

    let outcome = dispatcher.dispatch(SearchMode::Agentic).await.unwrap().unwrap();
    assert_eq!(outcome.path, SearchMode::Agentic);
    assert_eq!(outcome.stats.elapsed_ms, 300.0);
    assert_eq!(store.agentic_info().unwrap().kg_enhancements_count, 2);
    assert_eq!(store.query_log()[0].path, SearchMode::Agentic);
}

#[tokio::test]
async fn test_both_paths_failing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/agentic"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"detail": "index unavailable"})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let store = dispatcher.store().clone();
    store.update_search_state(SearchStatePatch::new().query("orders"));

    let err = dispatcher.dispatch(SearchMode::Agentic).await.unwrap_err();
    assert!(err.agentic.is_some());
    assert_eq!(err.plain.status(), Some(502));
    assert!(err.message().contains("index unavailable"));

    assert_eq!(store.error().as_deref(), Some(err.message()));
    assert!(!store.is_loading());

    let log = store.query_log();
    assert_eq!(log.len(), 1);
    assert!(!log[0].success);
    assert_eq!(log[0].results_count, 0);
    assert_eq!(log[0].elapsed_ms, 0.0);
    assert_eq!(log[0].path, SearchMode::Plain);
}

#[tokio::test]
async fn test_failure_keeps_previous_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["a"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let store = dispatcher.store().clone();
    store.update_search_state(SearchStatePatch::new().query("first"));
    dispatcher.dispatch(SearchMode::Plain).await.unwrap();

    store.update_search_state(SearchStatePatch::new().query("second"));
    assert!(dispatcher.dispatch(SearchMode::Plain).await.is_err());

    assert_eq!(store.results()[0].id, "a");
    assert!(store.error().is_some());
    assert_eq!(store.metrics().total_queries, 2);
    assert_eq!(store.metrics().error_rate, 50.0);
}

#[tokio::test]
async fn test_blank_query_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    dispatcher
        .store()
        .update_search_state(SearchStatePatch::new().query("   "));
    assert!(dispatcher.dispatch(SearchMode::Agentic).await.unwrap().is_none());
    assert!(dispatcher.store().query_log().is_empty());
}

#[tokio::test]
async fn test_observers_see_results_and_log() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["a", "b", "c"])))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    dispatcher.store().subscribe(move |event| {
        let label = match event {
            StoreEvent::ResultsReplaced { count, .. } => format!("results:{}", count),
            StoreEvent::QueryLogged(entry) => format!("logged:{}", entry.success),
            StoreEvent::SearchStateChanged { .. } => "state".to_string(),
            _ => "other".to_string(),
        };
        sink.lock().push(label);
    });

    dispatcher
        .store()
        .update_search_state(SearchStatePatch::new().query("orders"));
    dispatcher.dispatch(SearchMode::Plain).await.unwrap();

    assert_eq!(
        *events.lock(),
        vec!["state", "results:3", "logged:true"]
    );
}

#[tokio::test]
async fn test_concurrent_dispatches_last_writer_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json_query("slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(results_body(&["slow"]))
                .set_delay(std::time::Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json_query("fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["fast"])))
        .mount(&server)
        .await;

    for (policy, expected) in [(StalePolicy::Apply, "slow"), (StalePolicy::Discard, "fast")] {
        let client = Arc::new(RagApiClient::new(server.uri()));
        let store = AppStore::new().with_stale_policy(policy);
        let dispatcher = Dispatcher::new(client, store.clone());

        let mut slow_state = store.search_state();
        slow_state.query = "slow".to_string();
        let mut fast_state = store.search_state();
        fast_state.query = "fast".to_string();

        let (slow, fast) = tokio::join!(
            dispatcher.dispatch_state(slow_state, SearchMode::Plain),
            async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                dispatcher.dispatch_state(fast_state, SearchMode::Plain).await
            }
        );
        assert!(slow.is_ok() && fast.is_ok());

        assert_eq!(store.results()[0].id, expected, "policy {:?}", policy);
        assert_eq!(store.query_log().len(), 2);
        assert!(!store.is_loading());
    }
}

fn body_json_query(query: &'static str) -> impl wiremock::Match {
    move |request: &wiremock::Request| {
        serde_json::from_slice::<serde_json::Value>(&request.body)
            .map(|body| body["query"] == query)
            .unwrap_or(false)
    }
}
