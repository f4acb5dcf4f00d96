//! Encoder-decoder backend (T5-style models).

use tokenizers::Tokenizer;

use crate::backends::argmax;
use crate::error::{RankError, Result};
use crate::traits::{Generation, InferenceBackend, Seq2SeqLm};

/// Decoder seed used when none is configured.
///
/// T5 decoding starts from the pad token; seeding the decoder with
/// `"<pad> Passage"` steers instruction-tuned checkpoints toward emitting a
/// bare passage label as the next token.
pub const DEFAULT_DECODER_SEED: &str = "<pad> Passage";

/// Backend for encoder-decoder models.
///
/// Every generation starts the decoder from a fixed seed sequence and runs a
/// greedy argmax loop; only tokens generated past the seed are decoded into
/// the returned text.
///
/// # Example
///
/// ```ignore
/// let backend = EncoderDecoderBackend::new(model, tokenizer, "t5")?;
/// let out = backend.generate(&[prompt], 2)?;
/// ```
pub struct EncoderDecoderBackend {
    model: Box<dyn Seq2SeqLm>,
    tokenizer: Tokenizer,
    family: String,
    decoder_seed: Vec<u32>,
}

impl EncoderDecoderBackend {
    /// Wrap a loaded encoder-decoder model with the default decoder seed.
    ///
    /// Fails with a setup error if the seed text does not tokenize.
    pub fn new(
        model: Box<dyn Seq2SeqLm>,
        tokenizer: Tokenizer,
        family: impl Into<String>,
    ) -> Result<Self> {
        Self::with_decoder_seed(model, tokenizer, family, DEFAULT_DECODER_SEED)
    }

    /// Wrap a loaded encoder-decoder model with a custom decoder seed text.
    pub fn with_decoder_seed(
        model: Box<dyn Seq2SeqLm>,
        tokenizer: Tokenizer,
        family: impl Into<String>,
        seed_text: &str,
    ) -> Result<Self> {
        // add_special_tokens = false: the seed already spells out its own
        // start token.
        let encoding = tokenizer.encode(seed_text, false)?;
        let decoder_seed = encoding.get_ids().to_vec();
        if decoder_seed.is_empty() {
            return Err(RankError::Config(format!(
                "decoder seed {seed_text:?} tokenized to nothing"
            )));
        }
        Ok(Self {
            model,
            tokenizer,
            family: family.into(),
            decoder_seed,
        })
    }

    fn encode_prompts(&self, prompts: &[String]) -> Result<Vec<Vec<u32>>> {
        prompts
            .iter()
            .map(|p| Ok(self.tokenizer.encode(p.as_str(), true)?.get_ids().to_vec()))
            .collect()
    }
}

impl std::fmt::Debug for EncoderDecoderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderDecoderBackend")
            .field("family", &self.family)
            .field("decoder_seed", &self.decoder_seed)
            .finish_non_exhaustive()
    }
}

impl InferenceBackend for EncoderDecoderBackend {
    fn model_family(&self) -> &str {
        &self.family
    }

    fn generate(&mut self, prompts: &[String], max_new_tokens: usize) -> Result<Vec<Generation>> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }
        let input_ids = self.encode_prompts(prompts)?;
        let seed_len = self.decoder_seed.len();
        let mut decoder_ids: Vec<Vec<u32>> = vec![self.decoder_seed.clone(); prompts.len()];

        for _ in 0..max_new_tokens {
            let logits = self.model.next_logits(&input_ids, &decoder_ids)?;
            if logits.len() != prompts.len() {
                return Err(RankError::Inference(format!(
                    "model returned {} logit rows for {} sequences",
                    logits.len(),
                    prompts.len()
                )));
            }
            for (row, logit_row) in decoder_ids.iter_mut().zip(&logits) {
                row.push(argmax(logit_row)?);
            }
        }

        input_ids
            .iter()
            .zip(&decoder_ids)
            .map(|(input, decoder)| {
                let new_ids = &decoder[seed_len..];
                let text = self.tokenizer.decode(new_ids, true)?;
                Ok(Generation::new(text.trim(), input.len(), new_ids.len()))
            })
            .collect()
    }

    fn next_token_logits(&mut self, prompts: &[String]) -> Result<Vec<Vec<f32>>> {
        let input_ids = self.encode_prompts(prompts)?;
        let decoder_ids: Vec<Vec<u32>> = vec![self.decoder_seed.clone(); prompts.len()];
        self.model.next_logits(&input_ids, &decoder_ids)
    }
}
