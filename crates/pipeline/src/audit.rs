//! Audit Tracker - follows tracked combinations through the elimination pass.
//!
//! Each tracked combination moves through a small state machine:
//!
//! ```text
//! Untouched ──(matched, preserved)──▶ WouldEliminate(strike)
//!     │
//!     └─────(matched, removed)─────▶ Eliminated(strike)
//! ```
//!
//! Transitions only fire out of `Untouched`, so the first filter to match is
//! the one credited and later filters cannot overwrite it.

use data_loader::Combination;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// The filter credited with an elimination (real or prevented).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strike {
    pub filter_id: String,
    pub filter_name: String,
    /// 1-based position of the filter among the activated filters
    pub order: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Fate {
    #[default]
    Untouched,
    WouldEliminate(Strike),
    Eliminated(Strike),
}

/// What happened to one tracked combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub combo: Combination,
    /// Present in the candidate set before injection
    pub generated: bool,
    /// Added to the pool because it was tracked but not generated
    pub injected: bool,
    /// Preservation policy in force for this run
    pub preserved: bool,
    fate: Fate,
}

impl AuditEntry {
    fn new(combo: Combination, generated: bool, injected: bool, preserved: bool) -> Self {
        Self {
            combo,
            generated,
            injected,
            preserved,
            fate: Fate::Untouched,
        }
    }

    pub fn fate(&self) -> &Fate {
        &self.fate
    }

    pub fn eliminated_by(&self) -> Option<&Strike> {
        match &self.fate {
            Fate::Eliminated(strike) => Some(strike),
            _ => None,
        }
    }

    pub fn would_eliminate_by(&self) -> Option<&Strike> {
        match &self.fate {
            Fate::WouldEliminate(strike) => Some(strike),
            _ => None,
        }
    }

    /// Returns false when an earlier filter already claimed this entry.
    fn strike(&mut self, strike: Strike, preserved: bool) -> bool {
        if self.fate != Fate::Untouched {
            return false;
        }
        self.fate = if preserved {
            Fate::WouldEliminate(strike)
        } else {
            Fate::Eliminated(strike)
        };
        true
    }
}

/// Flat audit record for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub combo: Combination,
    pub generated: bool,
    pub survived: bool,
    pub eliminated: bool,
    pub eliminated_by: Option<String>,
    pub eliminated_order: Option<usize>,
    pub eliminated_name: Option<String>,
    pub would_eliminate_by: Option<String>,
    pub would_eliminate_order: Option<usize>,
    pub would_eliminate_name: Option<String>,
    pub injected: bool,
    pub preserved: bool,
}

/// Per-run audit state for every tracked combination, in the order the
/// combinations were first tracked.
#[derive(Debug, Clone, Default)]
pub struct AuditTracker {
    entries: Vec<AuditEntry>,
    index: HashMap<Combination, usize>,
    preserve: bool,
}

impl AuditTracker {
    /// Create one entry per tracked combination before any filter runs.
    ///
    /// `generated` is the candidate set before injection; `inject` says
    /// whether tracked-but-not-generated combinations join the pool.
    pub fn new<'a, I>(
        tracked: I,
        generated: &BTreeSet<Combination>,
        inject: bool,
        preserve: bool,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Combination>,
    {
        let mut tracker = Self {
            preserve,
            ..Self::default()
        };
        for combo in tracked {
            if tracker.index.contains_key(combo) {
                continue;
            }
            let was_generated = generated.contains(combo);
            tracker.index.insert(*combo, tracker.entries.len());
            tracker
                .entries
                .push(AuditEntry::new(*combo, was_generated, inject && !was_generated, preserve));
        }
        tracker
    }

    pub fn is_tracked(&self, combo: &Combination) -> bool {
        self.index.contains_key(combo)
    }

    /// Whether `combo` must stay in the pool when a filter matches it.
    pub fn preserves(&self, combo: &Combination) -> bool {
        self.preserve && self.is_tracked(combo)
    }

    /// Combinations that should be added to the candidate pool.
    pub fn injected(&self) -> impl Iterator<Item = &Combination> {
        self.entries.iter().filter(|e| e.injected).map(|e| &e.combo)
    }

    /// Record that `filter` matched `combo`. Untracked combinations and
    /// entries that were already struck are left alone.
    pub fn record_match(&mut self, combo: &Combination, filter_id: &str, filter_name: &str, order: usize) {
        let preserve = self.preserve;
        let Some(entry) = self.index.get(combo).and_then(|&i| self.entries.get_mut(i)) else {
            return;
        };
        let strike = Strike {
            filter_id: filter_id.to_string(),
            filter_name: filter_name.to_string(),
            order,
        };
        if entry.strike(strike, preserve) {
            debug!(
                "Tracked {} {} by {} (step {})",
                combo,
                if preserve { "would be eliminated" } else { "eliminated" },
                filter_id,
                order
            );
        }
    }

    pub fn entry(&self, combo: &Combination) -> Option<&AuditEntry> {
        self.index.get(combo).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten every entry against the final survivor pool.
    pub fn rows(&self, survivors: &BTreeSet<Combination>) -> Vec<AuditRow> {
        self.entries
            .iter()
            .map(|entry| {
                let eliminated = entry.eliminated_by();
                let would = entry.would_eliminate_by();
                AuditRow {
                    combo: entry.combo,
                    generated: entry.generated,
                    survived: survivors.contains(&entry.combo),
                    eliminated: eliminated.is_some(),
                    eliminated_by: eliminated.map(|s| s.filter_id.clone()),
                    eliminated_order: eliminated.map(|s| s.order),
                    eliminated_name: eliminated.map(|s| s.filter_name.clone()),
                    would_eliminate_by: would.map(|s| s.filter_id.clone()),
                    would_eliminate_order: would.map(|s| s.order),
                    would_eliminate_name: would.map(|s| s.filter_name.clone()),
                    injected: entry.injected,
                    preserved: entry.preserved,
                }
            })
            .collect()
    }
}
