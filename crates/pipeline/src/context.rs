//! Evaluation context for filter predicates.
//!
//! Every (combination, seed, previous seed) triple gets a fresh
//! `EvaluationContext` holding the raw number lists and the derived
//! scalars that predicates may reference by name.

use crate::expr::Value;
use data_loader::{Combination, LOW_MAX};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Names a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ComboNumbers,
    SeedNumbers,
    PrevSeedNumbers,
    FinalSum,
    FinalEvenCount,
    FinalOddCount,
    FinalMin,
    FinalMax,
    FinalRange,
    FinalLowCount,
    FinalHighCount,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Feature::ComboNumbers,
        Feature::SeedNumbers,
        Feature::PrevSeedNumbers,
        Feature::FinalSum,
        Feature::FinalEvenCount,
        Feature::FinalOddCount,
        Feature::FinalMin,
        Feature::FinalMax,
        Feature::FinalRange,
        Feature::FinalLowCount,
        Feature::FinalHighCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::ComboNumbers => "combo_numbers",
            Feature::SeedNumbers => "seed_numbers",
            Feature::PrevSeedNumbers => "prev_seed_numbers",
            Feature::FinalSum => "final_sum",
            Feature::FinalEvenCount => "final_even_count",
            Feature::FinalOddCount => "final_odd_count",
            Feature::FinalMin => "final_min",
            Feature::FinalMax => "final_max",
            Feature::FinalRange => "final_range",
            Feature::FinalLowCount => "final_low_count",
            Feature::FinalHighCount => "final_high_count",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derived features for one combination.
///
/// Built by `ContextBuilder::build` and never reused across combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    pub combo_numbers: Arc<[i64]>,
    /// Shared with the builder and every other context it produced
    pub seed_numbers: Arc<[i64]>,
    pub prev_seed_numbers: Arc<[i64]>,

    pub final_sum: i64,
    pub final_even_count: i64,
    pub final_odd_count: i64,
    pub final_min: i64,
    pub final_max: i64,
    pub final_range: i64,
    pub final_low_count: i64,
    pub final_high_count: i64,
}

impl EvaluationContext {
    /// Value of a feature. List features share this context's storage.
    pub fn get(&self, feature: Feature) -> Value {
        match feature {
            Feature::ComboNumbers => Value::List(self.combo_numbers.clone()),
            Feature::SeedNumbers => Value::List(self.seed_numbers.clone()),
            Feature::PrevSeedNumbers => Value::List(self.prev_seed_numbers.clone()),
            Feature::FinalSum => Value::Int(self.final_sum),
            Feature::FinalEvenCount => Value::Int(self.final_even_count),
            Feature::FinalOddCount => Value::Int(self.final_odd_count),
            Feature::FinalMin => Value::Int(self.final_min),
            Feature::FinalMax => Value::Int(self.final_max),
            Feature::FinalRange => Value::Int(self.final_range),
            Feature::FinalLowCount => Value::Int(self.final_low_count),
            Feature::FinalHighCount => Value::Int(self.final_high_count),
        }
    }
}

/// Builds evaluation contexts against fixed seed inputs.
///
/// Seeds are either a full valid set or absent; an absent seed shows up
/// in predicates as an empty list.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    seed_numbers: Arc<[i64]>,
    prev_seed_numbers: Arc<[i64]>,
}

impl ContextBuilder {
    pub fn new(seed: Option<Combination>, prev_seed: Option<Combination>) -> Self {
        Self {
            seed_numbers: to_list(seed),
            prev_seed_numbers: to_list(prev_seed),
        }
    }

    /// Compute the context for a single combination.
    pub fn build(&self, combo: &Combination) -> EvaluationContext {
        let numbers = combo.numbers();
        let count = numbers.len() as i64;

        let even = numbers.iter().filter(|&&n| n % 2 == 0).count() as i64;
        let low = numbers.iter().filter(|&&n| n <= LOW_MAX).count() as i64;
        let min = i64::from(combo.lowest());
        let max = i64::from(combo.highest());

        EvaluationContext {
            combo_numbers: numbers.iter().map(|&n| i64::from(n)).collect(),
            seed_numbers: self.seed_numbers.clone(),
            prev_seed_numbers: self.prev_seed_numbers.clone(),
            final_sum: i64::from(combo.sum()),
            final_even_count: even,
            final_odd_count: count - even,
            final_min: min,
            final_max: max,
            final_range: max - min,
            final_low_count: low,
            final_high_count: count - low,
        }
    }
}

fn to_list(set: Option<Combination>) -> Arc<[i64]> {
    set.map(|c| c.numbers().iter().map(|&n| i64::from(n)).collect())
        .unwrap_or_else(|| Arc::from([]))
}

/// Size of the multiset intersection of two sequences.
///
/// `shared_numbers([1, 1, 2], [1, 2, 2]) == 2`
pub fn shared_numbers(a: &[i64], b: &[i64]) -> usize {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &n in a {
        *counts.entry(n).or_insert(0) += 1;
    }

    let mut shared = 0;
    for n in b {
        if let Some(c) = counts.get_mut(n) {
            if *c > 0 {
                *c -= 1;
                shared += 1;
            }
        }
    }
    shared
}
