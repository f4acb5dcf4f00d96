//! Mock backend for testing.
//!
//! Queue-based and fully deterministic: each `generate` call consumes one
//! queued response per prompt, falling back to a default once the queue is
//! empty. Prompts are recorded so tests can assert on what the selector
//! actually asked.

use std::collections::VecDeque;

use crate::error::{RankError, Result};
use crate::traits::{Generation, InferenceBackend};

/// Deterministic mock implementation of [`InferenceBackend`].
///
/// # Example
///
/// ```
/// use setrank::{InferenceBackend, MockBackend};
///
/// let mut backend = MockBackend::new();
/// backend.push_response("B");
/// let out = backend.generate(&["pick one".to_string()], 2).unwrap();
/// assert_eq!(out[0].text, "B");
/// // Queue exhausted: default answer.
/// let out = backend.generate(&["pick one".to_string()], 2).unwrap();
/// assert_eq!(out[0].text, "A");
/// ```
pub struct MockBackend {
    responses: VecDeque<String>,
    default_response: String,
    prompts: Vec<String>,
}

impl MockBackend {
    /// Create a mock backend whose fallback answer is `"A"`.
    pub fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            default_response: "A".to_string(),
            prompts: Vec::new(),
        }
    }

    /// Change the answer returned once the queue is empty.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Queue one response.
    pub fn push_response(&mut self, response: impl Into<String>) {
        self.responses.push_back(response.into());
    }

    /// Queue several responses at once.
    pub fn push_responses<I, S>(&mut self, responses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for r in responses {
            self.push_response(r);
        }
    }

    /// Every prompt this backend has been asked, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Whether all queued responses have been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.responses.is_empty()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockBackend {
    fn model_family(&self) -> &str {
        "mock"
    }

    fn generate(&mut self, prompts: &[String], _max_new_tokens: usize) -> Result<Vec<Generation>> {
        let mut out = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            self.prompts.push(prompt.clone());
            let text = self
                .responses
                .pop_front()
                .unwrap_or_else(|| self.default_response.clone());
            let completion_tokens = text.split_whitespace().count();
            out.push(Generation::new(
                text,
                prompt.split_whitespace().count(),
                completion_tokens,
            ));
        }
        Ok(out)
    }

    fn next_token_logits(&mut self, _prompts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RankError::NotSupported(
            "logit access on the mock backend".to_string(),
        ))
    }
}

/// Tiny word-level tokenizer for backend unit tests.
///
/// `<pad>` and `</s>` are added special tokens, so they survive whitespace
/// pre-tokenization and are skipped on decode.
#[cfg(test)]
pub(crate) fn test_tokenizer() -> tokenizers::Tokenizer {
    let json = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 1, "content": "<pad>", "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true},
            {"id": 2, "content": "</s>", "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "[UNK]": 0, "<pad>": 1, "</s>": 2,
                "A": 3, "B": 4, "C": 5, "D": 6,
                "Passage": 7, "which": 8, "passage": 9,
                "first": 10, "prompt": 11, "second": 12, "q": 13
            },
            "unk_token": "[UNK]"
        }
    }"#;
    tokenizers::Tokenizer::from_bytes(json.as_bytes()).expect("test tokenizer json")
}
