//! setrank - Setwise LLM Reranking Engine
//!
//! Reranks retrieved document lists with a judge LLM: instead of scoring
//! documents one at a time, the engine shows the model small labeled groups
//! and asks which passage is the most relevant, then drives a partial heap
//! sort over those grouped judgments to surface the top-k.
//!
//! This crate provides:
//! - A ranking session producing top-k orderings with synthetic scores
//! - Setwise comparison with defensive label parsing and a fallback policy
//! - Permutation-randomized majority voting to dampen position/label bias
//! - Inference backends for encoder-decoder and decoder-only judge models
//! - A factory that resolves model families to the right backend shape
//!
//! # Backends
//!
//! | Backend | Models | Generation style |
//! |---------|--------|------------------|
//! | [`EncoderDecoderBackend`] | T5, mT5, BART | Greedy decode from a fixed decoder seed |
//! | [`DecoderOnlyBackend`] | Llama, Mistral, Qwen, ... | Left-padded batch, echo stripped |
//! | [`MockBackend`] | (tests) | Scripted response queue |
//!
//! # Architecture
//!
//! ```ascii
//! RankingSession ─► SetwiseSelector ─► SetwiseComparator ─► InferenceBackend
//!      │                (heap sort)      (single-shot or        │
//!      │                                  voting rounds)        ▼
//!      └─► SessionStats ◄── oracle/token accounting ◄── Seq2SeqLm / CausalLm
//! ```
//!
//! Model weights are loaded behind the [`Seq2SeqLm`] / [`CausalLm`] seams
//! through a [`ModelLoader`]; the engine itself never touches tensors.
//!
//! # Example
//!
//! ```
//! use setrank::{MockBackend, RankingSession, SearchResult, SetwiseSelector, SingleShotComparator};
//!
//! let selector = SetwiseSelector::new(Box::new(SingleShotComparator::new()))
//!     .with_num_child(3)
//!     .with_k(2);
//! let mut session = RankingSession::new(Box::new(MockBackend::new()), selector);
//!
//! let candidates = vec![
//!     SearchResult::with_text("d1", 12.0, "heap sort builds a heap first"),
//!     SearchResult::with_text("d2", 11.0, "bubble sort swaps neighbors"),
//!     SearchResult::with_text("d3", 10.0, "quick sort partitions"),
//! ];
//! let ranked = session.rerank("how does heap sort work?", &candidates)?;
//! assert_eq!(ranked.len(), 3);
//! assert_eq!(ranked[0].score, -1.0);
//! # Ok::<(), setrank::RankError>(())
//! ```
//!
//! # See Also
//!
//! - [`crate::traits`] for the backend and model trait definitions
//! - [`crate::ranker`] for the selection engine
//! - [`crate::factory`] for family-based backend construction

pub mod backends;
pub mod error;
pub mod factory;
pub mod ranker;
pub mod traits;

pub use backends::{
    ChatTemplate, DecoderOnlyBackend, EncoderDecoderBackend, MockBackend, DEFAULT_DECODER_SEED,
};
pub use error::{RankError, Result};
pub use factory::{BackendConfig, BackendFactory, BackendKind, DeviceHint, ModelLoader};
pub use ranker::{
    default_prompt, identity_labels, labeled_passages, parse_winner, ParsedLabel, PromptTemplate,
    RankingSession, SearchResult, SelectionMethod, SessionStats, SetwiseComparator,
    SetwiseSelector, SingleShotComparator, VotingComparator, DEFAULT_VOTING_SEED, LABELS,
};
pub use traits::{CausalLm, Generation, InferenceBackend, Seq2SeqLm};
