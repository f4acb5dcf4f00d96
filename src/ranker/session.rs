//! Ranking session: the external entry point.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::ranker::document::SearchResult;
use crate::ranker::setwise::SetwiseSelector;
use crate::traits::InferenceBackend;

/// Per-call oracle accounting, readable after a `rerank` completes.
///
/// Counters reset at the start of each call and only increase while it
/// runs. `comparisons` counts oracle invocations (each voting round counts
/// as one); the token totals accumulate the backend-reported usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub comparisons: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Holds a backend and a selector and turns candidate lists into rankings.
///
/// Construct once per backend configuration and reuse across queries; each
/// [`rerank`](Self::rerank) call owns its working state exclusively. The
/// session is not meant to be shared between concurrently executing calls.
///
/// # Example
///
/// ```
/// use setrank::{MockBackend, RankingSession, SearchResult, SetwiseSelector, SingleShotComparator};
///
/// let selector = SetwiseSelector::new(Box::new(SingleShotComparator::new()))
///     .with_num_child(3)
///     .with_k(2);
/// let mut session = RankingSession::new(Box::new(MockBackend::new()), selector);
///
/// let candidates = vec![
///     SearchResult::with_text("d1", 10.0, "machine learning"),
///     SearchResult::with_text("d2", 9.0, "deep learning"),
///     SearchResult::with_text("d3", 8.0, "cooking recipes"),
/// ];
/// let ranked = session.rerank("what is deep learning?", &candidates).unwrap();
/// assert_eq!(ranked.len(), 3);
/// assert_eq!(ranked[0].score, -1.0);
/// ```
pub struct RankingSession {
    backend: Box<dyn InferenceBackend>,
    selector: SetwiseSelector,
    stats: SessionStats,
}

impl RankingSession {
    pub fn new(backend: Box<dyn InferenceBackend>, selector: SetwiseSelector) -> Self {
        Self {
            backend,
            selector,
            stats: SessionStats::default(),
        }
    }

    /// Counters from the most recent `rerank` call.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &dyn InferenceBackend {
        self.backend.as_ref()
    }

    /// Rank `candidates` against `query`.
    ///
    /// The input is never mutated: selection runs on a private working copy.
    /// The output is a permutation (by `docid`) of the input: the top-k in
    /// selection order carrying synthetic descending scores `-1, -2, ...`,
    /// followed by every remaining document in its original relative order,
    /// continuing the score sequence. Output documents drop their `text`.
    pub fn rerank(&mut self, query: &str, candidates: &[SearchResult]) -> Result<Vec<SearchResult>> {
        self.stats = SessionStats::default();
        debug!(
            candidates = candidates.len(),
            k = self.selector.k(),
            family = self.backend.model_family(),
            "reranking"
        );

        let mut working: Vec<SearchResult> = candidates.to_vec();
        self.selector
            .select_top_k(self.backend.as_mut(), query, &mut working, &mut self.stats)?;
        working.reverse();

        let k = self.selector.k();
        let mut ranked = Vec::with_capacity(candidates.len());
        let mut top_ids: HashSet<&str> = HashSet::with_capacity(k.min(candidates.len()));
        let mut rank = 1i64;

        for doc in working.iter().take(k) {
            top_ids.insert(doc.docid.as_str());
            ranked.push(SearchResult::new(doc.docid.clone(), -(rank as f64)));
            rank += 1;
        }
        for doc in candidates {
            if !top_ids.contains(doc.docid.as_str()) {
                ranked.push(SearchResult::new(doc.docid.clone(), -(rank as f64)));
                rank += 1;
            }
        }

        debug!(
            comparisons = self.stats.comparisons,
            prompt_tokens = self.stats.prompt_tokens,
            completion_tokens = self.stats.completion_tokens,
            "reranking done"
        );
        Ok(ranked)
    }
}
