//! Backend factory keyed on declared architecture family.
//!
//! # Resolution Order
//!
//! 1. An explicitly forced [`BackendKind`] always wins.
//! 2. Otherwise the model's declared architecture family (the HuggingFace
//!    `model_type` string) is looked up in the family table.
//! 3. Unknown families fall back to the decoder-only variant with a
//!    non-fatal warning.
//!
//! The table ships with the families below and is extensible at runtime via
//! [`BackendFactory::register_family`] — new families register a mapping,
//! not a subclass hierarchy.
//!
//! | Kind | Families |
//! |------|----------|
//! | EncoderDecoder | t5, mt5, bart |
//! | DecoderOnly | llama, mistral, gpt2, gpt_neox, phi, qwen, baichuan, bloom, falcon, mpt, stablelm, opt, gpt_bigcode |
//!
//! # Example
//!
//! ```ignore
//! let factory = BackendFactory::new();
//! let config = BackendConfig::new("google/flan-t5-large").with_device(DeviceHint::Cuda(0));
//! let backend = factory.create_backend(&loader, &config)?;
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;
use tracing::warn;

use crate::backends::{DecoderOnlyBackend, EncoderDecoderBackend};
use crate::error::Result;
use crate::traits::{CausalLm, InferenceBackend, Seq2SeqLm};

/// Structural backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Encoder-decoder models (T5 family), fixed decoder seed sequence.
    EncoderDecoder,
    /// Decoder-only causal models, left-padded and echo-stripped.
    DecoderOnly,
}

impl BackendKind {
    /// Parse a backend kind from a string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "encoder-decoder" | "encoder_decoder" | "seq2seq" | "t5" => Some(Self::EncoderDecoder),
            "decoder-only" | "decoder_only" | "causal" | "causal-lm" | "causal_lm" => {
                Some(Self::DecoderOnly)
            }
            _ => None,
        }
    }
}

/// Where the model should run. Opaque to this crate; passed through to the
/// [`ModelLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceHint {
    #[default]
    Cpu,
    Cuda(usize),
    Metal,
}

/// Backend construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Model name or path (opaque to the core).
    pub model_ref: String,
    /// Optional custom tokenizer; defaults to the model's own.
    pub tokenizer_ref: Option<String>,
    /// Device placement hint.
    pub device: DeviceHint,
    /// Optional cache directory for downloaded weights.
    pub cache_dir: Option<PathBuf>,
    /// Force a specific backend variant, bypassing the family table.
    pub forced_kind: Option<BackendKind>,
}

impl BackendConfig {
    pub fn new(model_ref: impl Into<String>) -> Self {
        Self {
            model_ref: model_ref.into(),
            tokenizer_ref: None,
            device: DeviceHint::Cpu,
            cache_dir: None,
            forced_kind: None,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer_ref: impl Into<String>) -> Self {
        self.tokenizer_ref = Some(tokenizer_ref.into());
        self
    }

    pub fn with_device(mut self, device: DeviceHint) -> Self {
        self.device = device;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_forced_kind(mut self, kind: BackendKind) -> Self {
        self.forced_kind = Some(kind);
        self
    }
}

/// Model-resolution capability supplied by the caller.
///
/// Loading weights, picking dtypes and placing tensors on devices is the
/// model library's business, not this crate's; the factory only decides
/// *which* structural wrapper to put around whatever the loader produces.
/// Loader failures are setup errors: fatal, raised at construction, never
/// retried.
pub trait ModelLoader: Send {
    /// Declared architecture family of the model named by `config`
    /// (HuggingFace `model_type`, e.g. `"t5"` or `"llama"`).
    fn family(&self, config: &BackendConfig) -> Result<String>;

    /// Load the tokenizer for `config` (honoring `tokenizer_ref` when set).
    fn load_tokenizer(&self, config: &BackendConfig) -> Result<Tokenizer>;

    /// Load the model as an encoder-decoder runtime.
    fn load_seq2seq(&self, config: &BackendConfig) -> Result<Box<dyn Seq2SeqLm>>;

    /// Load the model as a causal runtime.
    fn load_causal(&self, config: &BackendConfig) -> Result<Box<dyn CausalLm>>;
}

/// Maps architecture families to backend variants and builds backends.
pub struct BackendFactory {
    families: HashMap<String, BackendKind>,
}

impl BackendFactory {
    /// Factory seeded with the built-in family table.
    pub fn new() -> Self {
        let mut families = HashMap::new();
        for family in ["t5", "mt5", "bart"] {
            families.insert(family.to_string(), BackendKind::EncoderDecoder);
        }
        for family in [
            "llama",
            "mistral",
            "gpt2",
            "gpt_neox",
            "phi",
            "qwen",
            "baichuan",
            "bloom",
            "falcon",
            "mpt",
            "stablelm",
            "opt",
            "gpt_bigcode",
        ] {
            families.insert(family.to_string(), BackendKind::DecoderOnly);
        }
        Self { families }
    }

    /// Register (or override) a family mapping at runtime.
    pub fn register_family(&mut self, family: impl Into<String>, kind: BackendKind) {
        self.families.insert(family.into().to_lowercase(), kind);
    }

    /// All families the table currently knows about.
    pub fn supported_families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = self.families.keys().map(String::as_str).collect();
        families.sort_unstable();
        families
    }

    /// Decide which backend variant to use for `family`.
    ///
    /// A forced kind wins; unknown families default to decoder-only with a
    /// warning.
    pub fn resolve_kind(&self, family: &str, forced: Option<BackendKind>) -> BackendKind {
        if let Some(kind) = forced {
            return kind;
        }
        match self.families.get(&family.to_lowercase()) {
            Some(kind) => *kind,
            None => {
                warn!(
                    family,
                    "architecture family not in table, defaulting to the decoder-only backend"
                );
                BackendKind::DecoderOnly
            }
        }
    }

    /// Resolve the variant for the model named by `config` and build the
    /// matching backend around what `loader` produces.
    pub fn create_backend(
        &self,
        loader: &dyn ModelLoader,
        config: &BackendConfig,
    ) -> Result<Box<dyn InferenceBackend>> {
        let family = loader.family(config)?;
        let kind = self.resolve_kind(&family, config.forced_kind);
        let tokenizer = loader.load_tokenizer(config)?;
        match kind {
            BackendKind::EncoderDecoder => {
                let model = loader.load_seq2seq(config)?;
                Ok(Box::new(EncoderDecoderBackend::new(model, tokenizer, family)?))
            }
            BackendKind::DecoderOnly => {
                let model = loader.load_causal(config)?;
                Ok(Box::new(DecoderOnlyBackend::new(model, tokenizer, family)?))
            }
        }
    }
}

impl Default for BackendFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RankError;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            BackendKind::from_str("encoder-decoder"),
            Some(BackendKind::EncoderDecoder)
        );
        assert_eq!(BackendKind::from_str("T5"), Some(BackendKind::EncoderDecoder));
        assert_eq!(
            BackendKind::from_str("causal_lm"),
            Some(BackendKind::DecoderOnly)
        );
        assert_eq!(BackendKind::from_str("bert"), None);
    }

    #[test]
    fn test_builtin_table() {
        let factory = BackendFactory::new();
        assert_eq!(
            factory.resolve_kind("t5", None),
            BackendKind::EncoderDecoder
        );
        assert_eq!(factory.resolve_kind("llama", None), BackendKind::DecoderOnly);
        assert_eq!(
            factory.resolve_kind("MISTRAL", None),
            BackendKind::DecoderOnly
        );
    }

    #[test]
    fn test_unknown_family_defaults_to_decoder_only() {
        let factory = BackendFactory::new();
        assert_eq!(
            factory.resolve_kind("rwkv", None),
            BackendKind::DecoderOnly
        );
    }

    #[test]
    fn test_forced_kind_wins() {
        let factory = BackendFactory::new();
        assert_eq!(
            factory.resolve_kind("llama", Some(BackendKind::EncoderDecoder)),
            BackendKind::EncoderDecoder
        );
    }

    #[test]
    fn test_register_family() {
        let mut factory = BackendFactory::new();
        factory.register_family("rwkv", BackendKind::DecoderOnly);
        factory.register_family("ul2", BackendKind::EncoderDecoder);
        assert_eq!(
            factory.resolve_kind("ul2", None),
            BackendKind::EncoderDecoder
        );
        assert!(factory.supported_families().contains(&"rwkv"));
        // Existing entries are untouched.
        assert_eq!(
            factory.resolve_kind("t5", None),
            BackendKind::EncoderDecoder
        );
    }

    #[test]
    fn test_config_builder() {
        let config = BackendConfig::new("meta-llama/Llama-2-7b-hf")
            .with_tokenizer("hf-internal-testing/llama-tokenizer")
            .with_device(DeviceHint::Cuda(1))
            .with_cache_dir("/tmp/models")
            .with_forced_kind(BackendKind::DecoderOnly);
        assert_eq!(config.model_ref, "meta-llama/Llama-2-7b-hf");
        assert_eq!(config.device, DeviceHint::Cuda(1));
        assert_eq!(config.forced_kind, Some(BackendKind::DecoderOnly));
    }

    struct FailingLoader;

    impl ModelLoader for FailingLoader {
        fn family(&self, config: &BackendConfig) -> Result<String> {
            Err(RankError::ModelNotFound(config.model_ref.clone()))
        }
        fn load_tokenizer(&self, _config: &BackendConfig) -> Result<Tokenizer> {
            unreachable!("family resolution fails first")
        }
        fn load_seq2seq(&self, _config: &BackendConfig) -> Result<Box<dyn Seq2SeqLm>> {
            unreachable!()
        }
        fn load_causal(&self, _config: &BackendConfig) -> Result<Box<dyn CausalLm>> {
            unreachable!()
        }
    }

    #[test]
    fn test_unresolvable_model_is_fatal_setup_error() {
        let factory = BackendFactory::new();
        let config = BackendConfig::new("no/such-model");
        let err = factory
            .create_backend(&FailingLoader, &config)
            .unwrap_err();
        assert!(err.is_setup());
    }
}
