//! Decoder-only backend (causal models: LLaMA, Mistral, Phi, ...).

use tokenizers::Tokenizer;

use crate::backends::argmax;
use crate::error::{RankError, Result};
use crate::traits::{CausalLm, Generation, InferenceBackend};

/// Pad token candidates, tried in order when wiring up a tokenizer that does
/// not declare one explicitly.
const PAD_CANDIDATES: &[&str] = &["<pad>", "</s>", "<|endoftext|>", "<eos>"];

/// Plain-text chat wrapping for instruction-tuned causal models.
///
/// A deliberately small stand-in for full chat-template engines: the prompt
/// is wrapped as `{system} {user_prefix}{prompt}{assistant_prefix}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTemplate {
    pub system: Option<String>,
    pub user_prefix: String,
    pub assistant_prefix: String,
}

impl ChatTemplate {
    /// Vicuna v1.5 conversation format.
    pub fn vicuna() -> Self {
        Self {
            system: Some(
                "A chat between a curious user and an artificial intelligence assistant. \
                 The assistant gives helpful, detailed, and polite answers to the user's questions."
                    .to_string(),
            ),
            user_prefix: " USER: ".to_string(),
            assistant_prefix: " ASSISTANT:".to_string(),
        }
    }

    fn apply(&self, prompt: &str) -> String {
        let mut out = String::new();
        if let Some(system) = &self.system {
            out.push_str(system);
        }
        out.push_str(&self.user_prefix);
        out.push_str(prompt.trim());
        out.push_str(&self.assistant_prefix);
        out
    }
}

/// Backend for decoder-only models.
///
/// Batches are left-padded with the pad token so every row ends at the same
/// generation frontier, decoding is greedy, and only the tokens generated
/// past the padded input are decoded — the echoed input span never reaches
/// the caller.
pub struct DecoderOnlyBackend {
    model: Box<dyn CausalLm>,
    tokenizer: Tokenizer,
    family: String,
    pad_id: u32,
    chat_template: Option<ChatTemplate>,
}

impl DecoderOnlyBackend {
    /// Wrap a loaded causal model.
    ///
    /// Fails with a setup error if the tokenizer exposes none of the known
    /// pad/eos tokens; use [`with_pad_id`](Self::with_pad_id) for exotic
    /// vocabularies.
    pub fn new(
        model: Box<dyn CausalLm>,
        tokenizer: Tokenizer,
        family: impl Into<String>,
    ) -> Result<Self> {
        let pad_id = PAD_CANDIDATES
            .iter()
            .find_map(|t| tokenizer.token_to_id(t))
            .ok_or_else(|| {
                RankError::Config(
                    "tokenizer declares no pad or eos token; set one with with_pad_id".to_string(),
                )
            })?;
        Ok(Self {
            model,
            tokenizer,
            family: family.into(),
            pad_id,
            chat_template: None,
        })
    }

    /// Override the token id used for left-padding.
    pub fn with_pad_id(mut self, pad_id: u32) -> Self {
        self.pad_id = pad_id;
        self
    }

    /// Wrap every prompt in a chat conversation format before encoding.
    pub fn with_chat_template(mut self, template: ChatTemplate) -> Self {
        self.chat_template = Some(template);
        self
    }

    /// Encode and left-pad a batch; returns the padded rows plus each row's
    /// unpadded length.
    fn encode_padded(&self, prompts: &[String]) -> Result<(Vec<Vec<u32>>, Vec<usize>)> {
        let mut rows = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let text = match &self.chat_template {
                Some(template) => template.apply(prompt),
                None => prompt.clone(),
            };
            rows.push(self.tokenizer.encode(text.as_str(), true)?.get_ids().to_vec());
        }
        let lengths: Vec<usize> = rows.iter().map(Vec::len).collect();
        let max_len = lengths.iter().copied().max().unwrap_or(0);
        for row in &mut rows {
            let missing = max_len - row.len();
            if missing > 0 {
                let mut padded = vec![self.pad_id; missing];
                padded.extend_from_slice(row);
                *row = padded;
            }
        }
        Ok((rows, lengths))
    }
}

impl InferenceBackend for DecoderOnlyBackend {
    fn model_family(&self) -> &str {
        &self.family
    }

    fn generate(&mut self, prompts: &[String], max_new_tokens: usize) -> Result<Vec<Generation>> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }
        let (mut rows, lengths) = self.encode_padded(prompts)?;
        let base_len = rows.first().map(Vec::len).unwrap_or(0);

        for _ in 0..max_new_tokens {
            let logits = self.model.next_logits(&rows, self.pad_id)?;
            if logits.len() != rows.len() {
                return Err(RankError::Inference(format!(
                    "model returned {} logit rows for {} sequences",
                    logits.len(),
                    rows.len()
                )));
            }
            for (row, logit_row) in rows.iter_mut().zip(&logits) {
                row.push(argmax(logit_row)?);
            }
        }

        rows.iter()
            .zip(&lengths)
            .map(|(row, &prompt_len)| {
                let new_ids = &row[base_len..];
                let text = self.tokenizer.decode(new_ids, true)?;
                Ok(Generation::new(text.trim(), prompt_len, new_ids.len()))
            })
            .collect()
    }

    fn next_token_logits(&mut self, prompts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (rows, _) = self.encode_padded(prompts)?;
        self.model.next_logits(&rows, self.pad_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::test_tokenizer;
    use std::sync::{Arc, Mutex};

    /// Always emits the same token and records the padded batches it saw.
    struct FixedCausal {
        token: u32,
        vocab_size: usize,
        seen_batches: Arc<Mutex<Vec<Vec<Vec<u32>>>>>,
    }

    impl CausalLm for FixedCausal {
        fn next_logits(&mut self, input_ids: &[Vec<u32>], _pad_id: u32) -> Result<Vec<Vec<f32>>> {
            self.seen_batches.lock().unwrap().push(input_ids.to_vec());
            let mut row = vec![0.0f32; self.vocab_size];
            row[self.token as usize] = 1.0;
            Ok(input_ids.iter().map(|_| row.clone()).collect())
        }
    }

    fn backend_emitting(token: u32) -> (DecoderOnlyBackend, Arc<Mutex<Vec<Vec<Vec<u32>>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = FixedCausal {
            token,
            vocab_size: 16,
            seen_batches: Arc::clone(&seen),
        };
        let backend =
            DecoderOnlyBackend::new(Box::new(model), test_tokenizer(), "llama").unwrap();
        (backend, seen)
    }

    #[test]
    fn test_echo_is_stripped() {
        let (mut backend, _) = backend_emitting(4);
        let out = backend
            .generate(&["which passage".to_string()], 1)
            .unwrap();
        assert_eq!(out[0].text, "B");
        assert_eq!(out[0].prompt_tokens, 2);
        assert_eq!(out[0].completion_tokens, 1);
    }

    #[test]
    fn test_batch_is_left_padded() {
        let (mut backend, seen) = backend_emitting(3);
        backend
            .generate(&["first prompt second".to_string(), "q".to_string()], 1)
            .unwrap();
        let batches = seen.lock().unwrap();
        let first_batch = &batches[0];
        // Both rows padded to length 3; the short row padded on the left
        // with <pad> (id 1).
        assert_eq!(first_batch[0], vec![10, 11, 12]);
        assert_eq!(first_batch[1], vec![1, 1, 13]);
    }

    #[test]
    fn test_chat_template_wraps_prompt() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = FixedCausal {
            token: 3,
            vocab_size: 16,
            seen_batches: Arc::clone(&seen),
        };
        let template = ChatTemplate {
            system: Some("q".to_string()),
            user_prefix: " which ".to_string(),
            assistant_prefix: " passage".to_string(),
        };
        let mut backend = DecoderOnlyBackend::new(Box::new(model), test_tokenizer(), "llama")
            .unwrap()
            .with_chat_template(template);
        backend.generate(&["first".to_string()], 1).unwrap();
        // "q which first passage" -> ids [13, 8, 10, 9]
        assert_eq!(seen.lock().unwrap()[0][0], vec![13, 8, 10, 9]);
    }

    #[test]
    fn test_vicuna_template_shape() {
        let template = ChatTemplate::vicuna();
        let wrapped = template.apply("rank these");
        assert!(wrapped.starts_with("A chat between"));
        assert!(wrapped.contains(" USER: rank these"));
        assert!(wrapped.ends_with(" ASSISTANT:"));
    }

    #[test]
    fn test_multi_token_generation_appends() {
        let (mut backend, seen) = backend_emitting(5);
        let out = backend.generate(&["q".to_string()], 3).unwrap();
        assert_eq!(out[0].text, "C C C");
        // Second forward call sees the first generated token appended.
        let batches = seen.lock().unwrap();
        assert_eq!(batches[1][0], vec![13, 5]);
    }
}
