//! Setwise selector: partial heap sort over an oracle-defined preorder.
//!
//! # Algorithm
//!
//! A `num_child`-ary max-heap where "compare" means "ask the judge model to
//! pick the most relevant of up to `num_child + 1` labeled documents":
//!
//! ```ascii
//! heapify(i):          group = [arr[i], children of i]
//!                            │
//!                            ▼
//!                  comparator.pick_best(group)   ── one oracle call
//!                            │
//!                 winner != i ? swap + recurse into displaced subtree
//!
//! heap_sort(k):   build heap (heapify n/num_child .. 0)
//!                 repeat k times: swap root to window end, shrink, heapify(0)
//! ```
//!
//! The sort is *partial*: after `k` extractions only the extracted prefix is
//! correctly ordered; everything below the cutoff is merely known to have
//! lost. Order among documents the judge treats as equal follows extraction
//! order and is unspecified beyond that.

use tracing::warn;

use crate::error::{RankError, Result};
use crate::ranker::document::SearchResult;
use crate::ranker::labels::{parse_winner, ParsedLabel, LABELS};
use crate::ranker::prompt::{default_prompt, identity_labels, labeled_passages, PromptTemplate};
use crate::ranker::session::SessionStats;
use crate::traits::InferenceBackend;

/// How the selector orders documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMethod {
    /// Partial heap sort, the only implemented method.
    #[default]
    HeapSort,
    /// Accepted by the parser for parity with the research tooling, but not
    /// implemented; selecting it fails before any comparison is issued.
    BubbleSort,
}

impl SelectionMethod {
    /// Parse a method name (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "heapsort" | "heap-sort" | "heap_sort" => Some(Self::HeapSort),
            "bubblesort" | "bubble-sort" | "bubble_sort" => Some(Self::BubbleSort),
            _ => None,
        }
    }
}

/// Picks the most relevant document within one labeled comparison group.
///
/// Returns the *within-group* index of the winner. Implementations must
/// advance `stats.comparisons` by however many oracle calls they spend on
/// the decision.
pub trait SetwiseComparator: Send {
    fn pick_best(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        group: &[&SearchResult],
        stats: &mut SessionStats,
    ) -> Result<usize>;
}

/// Base comparator: one prompt, one oracle call, one parsed label.
///
/// When no label can be recognized in the output, the comparator logs a
/// warning and falls back to the group's first element. For heapify that
/// first element is the current parent, so the fallback reads as "no
/// change" — but it does systematically favor whichever document occupies
/// the lowest index of a group, a bias reviewers should keep in mind.
pub struct SingleShotComparator {
    prompt: PromptTemplate,
    max_new_tokens: usize,
}

impl SingleShotComparator {
    /// Comparator with the stock prompt wording and a 2-token answer budget.
    pub fn new() -> Self {
        Self {
            prompt: default_prompt(),
            max_new_tokens: 2,
        }
    }

    /// Swap in a different prompt template (e.g. a defended variant).
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Change how many tokens the judge may spend on its answer.
    pub fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub(crate) fn prompt(&self) -> PromptTemplate {
        self.prompt.clone()
    }

    pub(crate) fn max_new_tokens(&self) -> usize {
        self.max_new_tokens
    }
}

impl Default for SingleShotComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl SetwiseComparator for SingleShotComparator {
    fn pick_best(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        group: &[&SearchResult],
        stats: &mut SessionStats,
    ) -> Result<usize> {
        stats.comparisons += 1;
        let passages = labeled_passages(group, identity_labels);
        let prompt = (self.prompt)(query, &passages);
        let outputs = backend.generate(&[prompt], self.max_new_tokens)?;
        let generation = outputs.first().ok_or_else(|| {
            RankError::Inference("backend returned no output for one prompt".to_string())
        })?;
        stats.prompt_tokens += generation.prompt_tokens as u64;
        stats.completion_tokens += generation.completion_tokens as u64;

        match parse_winner(&generation.text, group.len()) {
            ParsedLabel::Ok(idx) => Ok(idx),
            ParsedLabel::Unrecognized => {
                warn!(
                    output = %generation.text,
                    "unrecognized judge output, keeping the group's first document"
                );
                Ok(0)
            }
        }
    }
}

/// Heap-based top-k selector driving grouped comparisons through a backend.
pub struct SetwiseSelector {
    comparator: Box<dyn SetwiseComparator>,
    num_child: usize,
    k: usize,
    method: SelectionMethod,
}

impl SetwiseSelector {
    /// Selector with the defaults used throughout the research tooling:
    /// branching factor 3, top-10, heap sort.
    pub fn new(comparator: Box<dyn SetwiseComparator>) -> Self {
        Self {
            comparator,
            num_child: 3,
            k: 10,
            method: SelectionMethod::HeapSort,
        }
    }

    /// Heap branching factor; groups hold up to `num_child + 1` documents.
    pub fn with_num_child(mut self, num_child: usize) -> Self {
        self.num_child = num_child;
        self
    }

    /// Number of top documents whose order is guaranteed.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_method(mut self, method: SelectionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Run the configured selection over `arr` in place.
    ///
    /// Parameter validation and method dispatch happen here, before any
    /// oracle call is issued.
    pub(crate) fn select_top_k(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        arr: &mut [SearchResult],
        stats: &mut SessionStats,
    ) -> Result<()> {
        if self.k == 0 {
            return Err(RankError::InvalidRequest("k must be >= 1".to_string()));
        }
        if self.num_child == 0 {
            return Err(RankError::InvalidRequest(
                "num_child must be >= 1".to_string(),
            ));
        }
        if self.num_child + 1 > LABELS.len() {
            return Err(RankError::InvalidRequest(format!(
                "group size {} exceeds the {}-symbol label alphabet",
                self.num_child + 1,
                LABELS.len()
            )));
        }
        match self.method {
            SelectionMethod::HeapSort => self.heap_sort(backend, query, arr, stats),
            SelectionMethod::BubbleSort => Err(RankError::NotSupported(
                "bubblesort selection is not implemented".to_string(),
            )),
        }
    }

    /// Restore the heap property for the subtree rooted at `i` within the
    /// active window `[0, n)`.
    fn heapify(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        arr: &mut [SearchResult],
        n: usize,
        i: usize,
        stats: &mut SessionStats,
    ) -> Result<()> {
        let first_child = self.num_child * i + 1;
        if first_child >= n {
            return Ok(());
        }
        let last_child = (self.num_child * (i + 1) + 1).min(n);

        let best = {
            let mut group: Vec<&SearchResult> = Vec::with_capacity(1 + last_child - first_child);
            group.push(&arr[i]);
            group.extend(arr[first_child..last_child].iter());
            self.comparator.pick_best(backend, query, &group, stats)?
        };

        let largest = if best == 0 { i } else { first_child + best - 1 };
        if largest != i {
            arr.swap(i, largest);
            self.heapify(backend, query, arr, n, largest, stats)?;
        }
        Ok(())
    }

    /// Partial heap sort: after this returns, the last `min(k, n-1)`
    /// positions of `arr` hold the top documents in ascending order of
    /// extraction (the caller reverses).
    fn heap_sort(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        arr: &mut [SearchResult],
        stats: &mut SessionStats,
    ) -> Result<()> {
        let n = arr.len();
        if n < 2 {
            return Ok(());
        }
        for i in (0..=n / self.num_child).rev() {
            self.heapify(backend, query, arr, n, i, stats)?;
        }
        let mut extracted = 0;
        for window in (1..n).rev() {
            arr.swap(window, 0);
            extracted += 1;
            if extracted == self.k {
                break;
            }
            self.heapify(backend, query, arr, window, 0, stats)?;
        }
        Ok(())
    }
}
