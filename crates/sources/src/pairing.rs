//! Pairing Source - Tens × Ones Expansion
//!
//! Turns one tens pattern and one ones pattern into every valid draw they
//! can describe.
//!
//! ## Algorithm
//! 1. Keep the tens digits in canonical (ascending) order
//! 2. For each distinct permutation of the ones digits:
//!    - number_i = 10 * tens_i + ones_perm_i
//!    - keep it only if all five numbers are in 1..=69 and pairwise distinct
//! 3. Sort each kept 5-tuple; the set of sorted tuples is the result
//!
//! The full candidate set is the union over the cross product of all
//! supplied tens and ones patterns.

use crate::permutations::DistinctPermutations;
use data_loader::{Combination, DigitPattern, PICK};
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Sorted, deduplicated candidate pool.
pub type CandidateSet = BTreeSet<Combination>;

/// Generates candidate combinations from tens and ones survivor patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairingSource;

impl PairingSource {
    pub fn new() -> Self {
        Self
    }

    /// Every valid combination reachable from one (tens, ones) pair.
    pub fn expand_pair(&self, tens: &DigitPattern, ones: &DigitPattern) -> CandidateSet {
        let t = tens.digits();
        DistinctPermutations::new(ones.digits())
            .filter_map(|perm| {
                let mut numbers = [0u8; PICK];
                for i in 0..PICK {
                    numbers[i] = 10 * t[i] + perm[i];
                }
                Combination::new(numbers)
            })
            .collect()
    }

    /// Union of `expand_pair` over the cross product of both lists.
    ///
    /// Pairs are expanded in parallel; the result is a sorted set, so it
    /// does not depend on scheduling.
    #[instrument(skip_all, fields(tens = tens.len(), ones = ones.len()))]
    pub fn get_candidates(&self, tens: &[DigitPattern], ones: &[DigitPattern]) -> CandidateSet {
        let candidates = tens
            .par_iter()
            .fold(CandidateSet::new, |mut local, t| {
                for o in ones {
                    local.extend(self.expand_pair(t, o));
                }
                local
            })
            .reduce(CandidateSet::new, |mut acc, local| {
                acc.extend(local);
                acc
            });

        debug!(
            "Expanded {} pattern pairs into {} candidates",
            tens.len() * ones.len(),
            candidates.len()
        );
        candidates
    }
}
