//! Setwise ranking engine.
//!
//! # Module Structure
//!
//! ```ascii
//! ranker/
//! ├── mod.rs      ─► This file (re-exports)
//! ├── document.rs ─► SearchResult
//! ├── labels.rs   ─► Label alphabet + defensive output parsing
//! ├── prompt.rs   ─► PromptTemplate seam + stock wording
//! ├── setwise.rs  ─► SetwiseSelector, SingleShotComparator, heap sort
//! ├── voting.rs   ─► VotingComparator (permutation majority voting)
//! └── session.rs  ─► RankingSession, SessionStats
//! ```
//!
//! Data flow: candidates + query → [`RankingSession::rerank`] →
//! [`SetwiseSelector`] builds grouped comparison prompts → backend generates
//! → label parsed → heap restructured → top-k extracted → session reassembles
//! the final ordering (top-k reordered, remainder in original order).

mod document;
mod labels;
mod prompt;
mod session;
mod setwise;
mod voting;

pub use document::SearchResult;
pub use labels::{parse_winner, ParsedLabel, LABELS};
pub use prompt::{default_prompt, identity_labels, labeled_passages, PromptTemplate};
pub use session::{RankingSession, SessionStats};
pub use setwise::{SelectionMethod, SetwiseComparator, SetwiseSelector, SingleShotComparator};
pub use voting::{VotingComparator, DEFAULT_VOTING_SEED};
