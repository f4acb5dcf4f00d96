//! Voting comparator: permutation-randomized majority judgments.
//!
//! The judge model is position- and label-biased: which document wins can
//! depend on where it sits in the prompt and which letter it was assigned.
//! The voting comparator dampens both by repeating each comparison under
//! independent random document orders and label assignments, then majority
//! voting over the winners mapped back to their original group positions.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::error::{RankError, Result};
use crate::ranker::document::SearchResult;
use crate::ranker::labels::{parse_winner, ParsedLabel, LABELS};
use crate::ranker::prompt::labeled_passages;
use crate::ranker::session::SessionStats;
use crate::ranker::setwise::{SetwiseComparator, SingleShotComparator};
use crate::traits::InferenceBackend;

/// RNG seed used when none is supplied, matching the research tooling.
pub const DEFAULT_VOTING_SEED: u64 = 929;

/// Comparator that majority-votes over `num_permutation` randomized rounds.
///
/// With `num_permutation == 1` it behaves exactly like the wrapped
/// [`SingleShotComparator`]. Rounds whose output fails to parse are dropped
/// from the tally; only when every round fails does the comparator fall
/// back to the group's first document, mirroring the single-shot policy.
pub struct VotingComparator {
    inner: SingleShotComparator,
    num_permutation: usize,
    rng: StdRng,
}

impl VotingComparator {
    /// Voting comparator with an explicit random source.
    ///
    /// The RNG drives document shuffling, label shuffling and tie breaking;
    /// threading it through the constructor keeps test runs reproducible
    /// without process-global state.
    pub fn new(inner: SingleShotComparator, num_permutation: usize, rng: StdRng) -> Self {
        Self {
            inner,
            num_permutation,
            rng,
        }
    }

    /// Voting comparator seeded from a bare integer.
    pub fn seeded(inner: SingleShotComparator, num_permutation: usize, seed: u64) -> Self {
        Self::new(inner, num_permutation, StdRng::seed_from_u64(seed))
    }

    /// One randomized round: shuffled document order, shuffled label
    /// assignment, winner mapped back to the original group index.
    fn run_round(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        group: &[&SearchResult],
        stats: &mut SessionStats,
    ) -> Result<Option<usize>> {
        let len = group.len();
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        let mut label_slots: Vec<usize> = (0..len).collect();
        label_slots.shuffle(&mut self.rng);

        let shuffled: Vec<&SearchResult> = order.iter().map(|&i| group[i]).collect();
        let passages = labeled_passages(&shuffled, |pos| LABELS[label_slots[pos]]);
        let prompt = (self.inner.prompt())(query, &passages);
        let outputs = backend.generate(&[prompt], self.inner.max_new_tokens())?;
        let generation = outputs.first().ok_or_else(|| {
            RankError::Inference("backend returned no output for one prompt".to_string())
        })?;
        stats.prompt_tokens += generation.prompt_tokens as u64;
        stats.completion_tokens += generation.completion_tokens as u64;

        // The round's alphabet is the same contiguous prefix, just assigned
        // to shuffled positions; parse against the prefix, then map the
        // label slot back to the prompt position and through the shuffle.
        match parse_winner(&generation.text, len) {
            ParsedLabel::Ok(slot) => {
                let position = label_slots.iter().position(|&s| s == slot).ok_or_else(|| {
                    RankError::Inference("label slot lookup failed".to_string())
                })?;
                Ok(Some(order[position]))
            }
            ParsedLabel::Unrecognized => Ok(None),
        }
    }
}

impl SetwiseComparator for VotingComparator {
    fn pick_best(
        &mut self,
        backend: &mut dyn InferenceBackend,
        query: &str,
        group: &[&SearchResult],
        stats: &mut SessionStats,
    ) -> Result<usize> {
        if self.num_permutation <= 1 {
            return self.inner.pick_best(backend, query, group, stats);
        }

        stats.comparisons += self.num_permutation as u64;
        let mut votes: Vec<usize> = Vec::with_capacity(self.num_permutation);
        for _ in 0..self.num_permutation {
            if let Some(winner) = self.run_round(backend, query, group, stats)? {
                votes.push(winner);
            }
        }

        if votes.is_empty() {
            warn!("every voting round failed to parse, keeping the group's first document");
            return Ok(0);
        }

        let mut tally: HashMap<usize, usize> = HashMap::new();
        for vote in &votes {
            *tally.entry(*vote).or_insert(0) += 1;
        }
        let max_count = tally.values().copied().max().unwrap_or(0);
        let mut winners: Vec<usize> = tally
            .into_iter()
            .filter(|&(_, count)| count == max_count)
            .map(|(idx, _)| idx)
            .collect();
        winners.sort_unstable();
        Ok(winners[self.rng.gen_range(0..winners.len())])
    }
}
