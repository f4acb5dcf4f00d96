//! Backend trait definitions.
//!
//! # Architecture
//!
//! ```ascii
//!                  ┌────────────────────────┐
//!                  │   InferenceBackend     │
//!                  │ generate / next logits │
//!                  └───────────┬────────────┘
//!                              │
//!            ┌─────────────────┼──────────────────┐
//!            ▼                 ▼                  ▼
//! ┌──────────────────┐ ┌────────────────┐ ┌──────────────┐
//! │ EncoderDecoder   │ │ DecoderOnly    │ │ MockBackend  │
//! │ (fixed decoder   │ │ (left-padded,  │ │ (tests)      │
//! │  seed sequence)  │ │  echo-stripped)│ │              │
//! └────────┬─────────┘ └───────┬────────┘ └──────────────┘
//!          ▼                   ▼
//!   dyn Seq2SeqLm        dyn CausalLm
//! ```
//!
//! The two lower traits, [`Seq2SeqLm`] and [`CausalLm`], are the seam where
//! the actual model library plugs in: a single batched forward pass that
//! yields next-token logits. Everything above that seam (tokenization,
//! padding, the greedy decode loop, echo stripping) lives in this crate;
//! everything below it (weights, device placement) belongs to the model
//! loader and is out of scope here.

use crate::error::Result;

/// One generated completion, with token accounting for session counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Generated text, with any echoed input span already removed.
    pub text: String,
    /// Tokens in the (unpadded) prompt.
    pub prompt_tokens: usize,
    /// Tokens actually generated.
    pub completion_tokens: usize,
}

impl Generation {
    pub fn new(text: impl Into<String>, prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            text: text.into(),
            prompt_tokens,
            completion_tokens,
        }
    }
}

/// Uniform generate/compare contract over structurally different models.
///
/// Implementations must be deterministic (greedy decoding, temperature
/// effectively zero): given the same prompts, the same texts come back, so
/// ranking behavior is reproducible once the voting RNG seed is fixed.
///
/// `generate` is order-preserving and returns exactly one [`Generation`] per
/// input prompt; batch size >= 1 must be supported.
pub trait InferenceBackend: Send {
    /// Declared architecture family of the wrapped model (e.g. `"t5"`,
    /// `"llama"`, `"mock"`).
    fn model_family(&self) -> &str;

    /// Greedily generate up to `max_new_tokens` tokens for each prompt.
    fn generate(&mut self, prompts: &[String], max_new_tokens: usize) -> Result<Vec<Generation>>;

    /// Per-vocabulary logits for the next generated position of each prompt.
    ///
    /// Exposed for likelihood-based scoring variants; the default comparison
    /// path never calls this.
    fn next_token_logits(&mut self, prompts: &[String]) -> Result<Vec<Vec<f32>>>;
}

impl std::fmt::Debug for dyn InferenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceBackend")
            .field("model_family", &self.model_family())
            .finish_non_exhaustive()
    }
}

/// Batched forward pass of an encoder-decoder model.
///
/// Returns next-token logits (one row of vocabulary scores per sequence)
/// given the encoder inputs and the current decoder prefixes. Rows of
/// `input_ids` may be ragged; padding and masking are the implementation's
/// concern.
pub trait Seq2SeqLm: Send {
    fn next_logits(
        &mut self,
        input_ids: &[Vec<u32>],
        decoder_input_ids: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>>;
}

/// Batched forward pass of a decoder-only (causal) model.
///
/// Rows of `input_ids` are left-padded to equal length with `pad_id`;
/// implementations derive their attention mask from that padding.
pub trait CausalLm: Send {
    fn next_logits(&mut self, input_ids: &[Vec<u32>], pad_id: u32) -> Result<Vec<Vec<f32>>>;
}
