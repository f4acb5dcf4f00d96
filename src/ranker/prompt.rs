//! Prompt construction seam.
//!
//! Prompt wording is a collaborator, not core logic: adversarial-defense
//! research swaps templates without touching the selector. A template is any
//! `(query, labeled_passages) -> prompt` function; the selector only
//! requires that the wording instructs the judge to emit a recognizable
//! single-character label from the active alphabet.

use std::sync::Arc;

use crate::ranker::document::SearchResult;
use crate::ranker::labels::LABELS;

/// Builds one comparison prompt from a query and the pre-rendered labeled
/// passage block.
pub type PromptTemplate = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// The stock setwise wording.
pub fn default_prompt() -> PromptTemplate {
    Arc::new(|query, passages| {
        format!(
            "Given a query \"{query}\", which of the following passages is the most \
             relevant one to the query?\n\n{passages}\n\n\
             Output only the passage label of the most relevant passage:"
        )
    })
}

/// Render a comparison group as a labeled passage block:
///
/// ```text
/// Passage A: "..."
///
/// Passage B: "..."
/// ```
///
/// `label_of(position)` decides which alphabet symbol each position gets,
/// letting the voting comparator relabel without rebuilding the group.
pub fn labeled_passages<F>(group: &[&SearchResult], label_of: F) -> String
where
    F: Fn(usize) -> char,
{
    group
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("Passage {}: \"{}\"", label_of(i), doc.text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Identity labeling: position `i` gets the `i`-th alphabet symbol.
pub fn identity_labels(i: usize) -> char {
    LABELS[i]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_passage_block() {
        let d1 = SearchResult::with_text("1", 0.0, "first text");
        let d2 = SearchResult::with_text("2", 0.0, "second text");
        let block = labeled_passages(&[&d1, &d2], identity_labels);
        assert_eq!(
            block,
            "Passage A: \"first text\"\n\nPassage B: \"second text\""
        );
    }

    #[test]
    fn test_custom_labeling() {
        let d1 = SearchResult::with_text("1", 0.0, "x");
        let d2 = SearchResult::with_text("2", 0.0, "y");
        let block = labeled_passages(&[&d1, &d2], |i| if i == 0 { 'C' } else { 'A' });
        assert!(block.starts_with("Passage C: \"x\""));
        assert!(block.contains("Passage A: \"y\""));
    }

    #[test]
    fn test_default_prompt_mentions_query_and_passages() {
        let template = default_prompt();
        let prompt = template("rust heaps", "Passage A: \"p\"");
        assert!(prompt.contains("\"rust heaps\""));
        assert!(prompt.contains("Passage A: \"p\""));
        assert!(prompt.ends_with("relevant passage:"));
    }

    #[test]
    fn test_missing_text_renders_empty() {
        let doc = SearchResult::new("1", 0.0);
        let block = labeled_passages(&[&doc], identity_labels);
        assert_eq!(block, "Passage A: \"\"");
    }
}
