//! Ranking error types.
//!
//! # Error Handling Philosophy
//!
//! Errors fall into three buckets, and callers are expected to treat them
//! differently:
//!
//! | Bucket | Variants | Caller behavior |
//! |--------|----------|-----------------|
//! | Setup | `ModelNotFound`, `Tokenizer`, `Config` | Fatal at construction, never retried |
//! | Runtime | `Inference` | Aborts the ranking call |
//! | Misuse | `InvalidRequest`, `NotSupported` | Raised before any oracle call is issued |
//!
//! Unparseable oracle output is deliberately *not* an error: the selector
//! recovers locally with a logged fallback (see `ranker::labels`), so a
//! ranking request either returns a full permutation of its input or fails
//! before doing any comparison work.

use thiserror::Error;

/// Result type for ranking operations.
pub type Result<T> = std::result::Result<T, RankError>;

/// Errors that can occur while building backends or running a ranking.
#[derive(Debug, Error)]
pub enum RankError {
    /// The named model could not be resolved.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Tokenizer loading or encoding failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid backend or session configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The underlying model failed during a forward pass.
    #[error("inference error: {0}")]
    Inference(String),

    /// Caller-supplied parameters are out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A requested capability is not implemented.
    #[error("not supported: {0}")]
    NotSupported(String),
}

impl RankError {
    /// Whether this error belongs to the setup bucket (raised at
    /// construction, never retried).
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_) | Self::Tokenizer(_) | Self::Config(_)
        )
    }

    /// Whether this error is raised before any oracle call is issued.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::NotSupported(_))
    }
}

impl From<tokenizers::Error> for RankError {
    fn from(err: tokenizers::Error) -> Self {
        RankError::Tokenizer(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = RankError::ModelNotFound("google/flan-t5-large".to_string());
        assert_eq!(error.to_string(), "model not found: google/flan-t5-large");

        let error = RankError::NotSupported("bubblesort".to_string());
        assert_eq!(error.to_string(), "not supported: bubblesort");

        let error = RankError::InvalidRequest("k must be >= 1".to_string());
        assert_eq!(error.to_string(), "invalid request: k must be >= 1");
    }

    #[test]
    fn test_setup_classification() {
        assert!(RankError::ModelNotFound("x".to_string()).is_setup());
        assert!(RankError::Tokenizer("bad file".to_string()).is_setup());
        assert!(RankError::Config("no pad token".to_string()).is_setup());
        assert!(!RankError::Inference("nan logits".to_string()).is_setup());
        assert!(!RankError::NotSupported("bubblesort".to_string()).is_setup());
    }

    #[test]
    fn test_misuse_classification() {
        assert!(RankError::InvalidRequest("k = 0".to_string()).is_misuse());
        assert!(RankError::NotSupported("bubblesort".to_string()).is_misuse());
        assert!(!RankError::Inference("oom".to_string()).is_misuse());
    }
}
