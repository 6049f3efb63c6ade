//! Run results.

use data_loader::{Combination, InputError};
use pipeline::{AuditRow, Strike};
use serde::Serialize;

/// A raw input token that was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputIssue {
    /// Which input it came from: tens, ones, tracked, seed or prev_seed
    pub input: &'static str,
    pub token: String,
    pub reason: String,
}

impl InputIssue {
    pub fn new(input: &'static str, error: &InputError) -> Self {
        Self {
            input,
            token: error.token().to_string(),
            reason: error.to_string(),
        }
    }
}

/// One filter as listed for activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub id: String,
    pub name: String,
    pub enabled_default: bool,
    /// Eliminations against the full candidate pool
    pub initial_cuts: usize,
    /// Step index when activated
    pub step: Option<usize>,
    /// Combinations this filter actually removed, when activated
    pub eliminated: Option<usize>,
    /// Tracked combinations it would have removed, when activated
    pub preserved: Option<usize>,
}

/// A surviving combination for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurvivorLine {
    pub combo: Combination,
    pub tracked: bool,
    /// Set when the preservation policy kept this combination alive
    pub would_eliminate: Option<Strike>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub tens_patterns: usize,
    pub ones_patterns: usize,
    pub tracked: usize,
    /// Candidates produced by pairing, before injection
    pub generated: usize,
    pub injected: usize,
    pub activated_filters: usize,
    pub survivors: usize,
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub totals: RunTotals,
    pub input_issues: Vec<InputIssue>,
    /// Listed filters in listing order
    pub filters: Vec<FilterSummary>,
    /// Tracked survivors first, then the rest; each group ascending
    pub survivors: Vec<SurvivorLine>,
    pub audit: Vec<AuditRow>,
}

impl RunReport {
    /// Surviving combinations in ascending order.
    pub fn survivor_combos(&self) -> Vec<Combination> {
        let mut combos: Vec<Combination> = self.survivors.iter().map(|s| s.combo).collect();
        combos.sort();
        combos
    }

    /// Filters that took part in elimination, in step order.
    pub fn activated(&self) -> Vec<&FilterSummary> {
        let mut active: Vec<&FilterSummary> = self.filters.iter().filter(|f| f.step.is_some()).collect();
        active.sort_by_key(|f| f.step);
        active
    }
}

impl std::fmt::Display for SurvivorLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.combo)?;
        if let Some(strike) = &self.would_eliminate {
            write!(
                f,
                " (would be eliminated by {} at step {} ({}); preserved)",
                strike.filter_id, strike.order, strike.filter_name
            )?;
        }
        Ok(())
    }
}
