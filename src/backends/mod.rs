//! Concrete inference backends.
//!
//! Two structural variants cover the model families the factory knows about:
//!
//! - [`EncoderDecoderBackend`]: T5-style models with a fixed decoder seed
//!   sequence.
//! - [`DecoderOnlyBackend`]: causal models (LLaMA, Mistral, Phi, ...) with
//!   left-padded batches and echo stripping.
//!
//! [`MockBackend`] is a deterministic queue-based backend for tests.

mod decoder_only;
mod encoder_decoder;
mod mock;

pub use decoder_only::{ChatTemplate, DecoderOnlyBackend};
pub use encoder_decoder::{EncoderDecoderBackend, DEFAULT_DECODER_SEED};
pub use mock::MockBackend;

use crate::error::{RankError, Result};

/// Index of the largest logit. Greedy decoding only, so ties resolve to the
/// lowest index, which keeps generation deterministic.
pub(crate) fn argmax(logits: &[f32]) -> Result<u32> {
    let mut best = match logits.first() {
        Some(v) => (0usize, *v),
        None => return Err(RankError::Inference("empty logit row".to_string())),
    };
    for (i, v) in logits.iter().enumerate().skip(1) {
        if *v > best.1 {
            best = (i, *v);
        }
    }
    Ok(best.0 as u32)
}
