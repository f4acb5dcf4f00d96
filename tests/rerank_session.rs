//! End-to-end tests for the ranking session.
//!
//! These tests drive the full pipeline through the public API with the mock
//! backend, so they are deterministic and always safe to run in CI.
//!
//! # Running
//!
//! ```bash
//! # All session e2e tests
//! cargo test --test rerank_session
//!
//! # Specific test
//! cargo test --test rerank_session test_scripted_heap_sort_pipeline
//! ```
//!
//! # Test coverage
//!
//! - Scripted oracle answers producing a known top-k ordering
//! - Session reuse across queries (counter reset)
//! - Voting comparator wired through the session
//! - Stats serialization for downstream reporting

use setrank::{
    MockBackend, RankingSession, SearchResult, SessionStats, SetwiseSelector,
    SingleShotComparator, VotingComparator, DEFAULT_VOTING_SEED,
};

/// Capture engine logs in the test output; repeated calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn candidates() -> Vec<SearchResult> {
    vec![
        SearchResult::with_text("d1", 14.2, "heap sort builds a heap first"),
        SearchResult::with_text("d2", 13.8, "bubble sort swaps neighbors"),
        SearchResult::with_text("d3", 12.1, "heap sort extracts the maximum repeatedly"),
        SearchResult::with_text("d4", 11.6, "quick sort partitions around a pivot"),
    ]
}

#[test]
fn test_scripted_heap_sort_pipeline() {
    init_tracing();
    // Four documents, branching factor 3, top-2. The heap build compares the
    // whole group once ("C" promotes d3 to the root); the first extraction
    // re-heapifies the remaining three ("B" promotes d2). The second
    // extraction is the last, so no further oracle call is made.
    let mut backend = MockBackend::new();
    backend.push_responses(["C", "B"]);

    let selector = SetwiseSelector::new(Box::new(SingleShotComparator::new()))
        .with_num_child(3)
        .with_k(2);
    let mut session = RankingSession::new(Box::new(backend), selector);
    assert_eq!(session.backend().model_family(), "mock");

    let ranked = session.rerank("how does heap sort work?", &candidates()).unwrap();

    let ids: Vec<&str> = ranked.iter().map(|d| d.docid.as_str()).collect();
    let scores: Vec<f64> = ranked.iter().map(|d| d.score).collect();
    assert_eq!(ids, vec!["d3", "d2", "d1", "d4"]);
    assert_eq!(scores, vec![-1.0, -2.0, -3.0, -4.0]);
    assert!(ranked.iter().all(|d| d.text.is_none()));

    let stats = session.stats();
    assert_eq!(stats.comparisons, 2);
    assert!(stats.prompt_tokens > 0);
    assert!(stats.completion_tokens > 0);
}

#[test]
fn test_session_reuse_resets_counters() {
    init_tracing();
    let selector = SetwiseSelector::new(Box::new(SingleShotComparator::new()))
        .with_num_child(3)
        .with_k(2);
    let mut session = RankingSession::new(Box::new(MockBackend::new()), selector);

    session.rerank("first query", &candidates()).unwrap();
    let first = session.stats();
    session.rerank("second query", &candidates()).unwrap();
    let second = session.stats();

    // Identical input and a deterministic backend: the second call spends
    // exactly the same budget, not an accumulated one.
    assert_eq!(first, second);
}

#[test]
fn test_voting_session_end_to_end() {
    init_tracing();
    // Two documents fit in one comparison group, so the whole ranking is one
    // voted decision: three randomized rounds, each one oracle call.
    let comparator =
        VotingComparator::seeded(SingleShotComparator::new(), 3, DEFAULT_VOTING_SEED);
    let selector = SetwiseSelector::new(Box::new(comparator))
        .with_num_child(3)
        .with_k(1);
    let mut session = RankingSession::new(Box::new(MockBackend::new()), selector);

    let docs = vec![
        SearchResult::with_text("d1", 2.0, "cats"),
        SearchResult::with_text("d2", 1.0, "dogs"),
    ];
    let ranked = session.rerank("pets", &docs).unwrap();

    assert_eq!(ranked.len(), 2);
    let mut ids: Vec<&str> = ranked.iter().map(|d| d.docid.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["d1", "d2"]);
    assert_eq!(session.stats().comparisons, 3);
}

#[test]
fn test_stats_serialize_for_reporting() {
    init_tracing();
    let selector = SetwiseSelector::new(Box::new(SingleShotComparator::new())).with_k(1);
    let mut session = RankingSession::new(Box::new(MockBackend::new()), selector);
    session.rerank("q", &candidates()).unwrap();

    let json = serde_json::to_value(session.stats()).unwrap();
    assert!(json.get("comparisons").is_some());
    assert!(json.get("prompt_tokens").is_some());
    assert!(json.get("completion_tokens").is_some());

    let default = serde_json::to_value(SessionStats::default()).unwrap();
    assert_eq!(default["comparisons"], 0);
}
