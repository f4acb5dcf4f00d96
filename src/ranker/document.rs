//! Document types flowing through a ranking.

use serde::{Deserialize, Serialize};

/// One retrieved document in a candidate list.
///
/// Identity is `docid`. `score` is advisory metadata from the upstream
/// retriever on input; on output it carries the synthetic rank-derived score
/// (`-1.0` for the best document, `-2.0` for the next, ...). `text` is
/// consumed during ranking and absent from the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub docid: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SearchResult {
    pub fn new(docid: impl Into<String>, score: f64) -> Self {
        Self {
            docid: docid.into(),
            score,
            text: None,
        }
    }

    pub fn with_text(docid: impl Into<String>, score: f64, text: impl Into<String>) -> Self {
        Self {
            docid: docid.into(),
            score,
            text: Some(text.into()),
        }
    }

    /// Document body, or the empty string when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}
