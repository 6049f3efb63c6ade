//! # Pairing Orchestrator
//!
//! Coordinates one final-pairing run:
//! 1. Normalize tens/ones patterns, tracked sets, and seeds
//! 2. Expand every tens x ones pair into candidate combinations
//! 3. Inject tracked combinations when requested
//! 4. Count initial eliminations for every loaded filter
//! 5. Rank and activate filters
//! 6. Run the elimination pass with audit tracking
//! 7. Assemble the report

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use data_loader::{Combination, DigitPattern, normalize_finals, normalize_ones, normalize_tens, parse_number_set};
use pipeline::{AuditTracker, ContextBuilder, FilterPipeline, FilterRecord, FilterRegistry, LoadReport};
use sources::{CandidateSet, PairingSource};

use crate::config::{Activation, ActivationOrder, RunConfig, RunInputs};
use crate::report::{FilterSummary, InputIssue, RunReport, RunTotals, SurvivorLine};

/// Normalized inputs plus the candidate pool, ready for filtering.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub tens: Vec<DigitPattern>,
    pub ones: Vec<DigitPattern>,
    pub tracked: Vec<Combination>,
    pub contexts: ContextBuilder,
    pub input_issues: Vec<InputIssue>,
    /// Pairing output before injection
    pub generated: CandidateSet,
    /// Generated plus injected combinations
    pub pool: CandidateSet,
    /// Initial eliminations, one per registry entry in registry order
    pub initial_cuts: Vec<usize>,
}

/// Main orchestrator that owns the loaded filters and run settings.
#[derive(Clone)]
pub struct PairingOrchestrator {
    registry: Arc<FilterRegistry>,
    source: PairingSource,
    config: RunConfig,
}

impl PairingOrchestrator {
    pub fn new(registry: Arc<FilterRegistry>, config: RunConfig) -> Self {
        Self {
            registry,
            source: PairingSource::new(),
            config,
        }
    }

    /// Load filter sources and build an orchestrator over them.
    pub fn from_filter_paths<P: AsRef<Path>>(paths: &[P], config: RunConfig) -> Result<(Self, LoadReport)> {
        let (registry, report) =
            FilterRegistry::load_from_paths(paths).context("Failed to load filter definitions")?;
        Ok((Self::new(Arc::new(registry), config), report))
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Everything up to (not including) filter activation.
    pub fn prepare(&self, inputs: &RunInputs) -> Prepared {
        let start_time = Instant::now();
        let mut input_issues = Vec::new();

        let tens = normalize_tens(&inputs.tens);
        let ones = normalize_ones(&inputs.ones);
        let tracked = normalize_finals(&inputs.tracked);
        for (input, rejected) in [
            ("tens", &tens.rejected),
            ("ones", &ones.rejected),
            ("tracked", &tracked.rejected),
        ] {
            for error in rejected {
                warn!("Ignored invalid {} entry {}", input, error);
                input_issues.push(InputIssue::new(input, error));
            }
        }

        let seed = self.parse_seed("seed", &inputs.seed, &mut input_issues);
        let prev_seed = self.parse_seed("prev_seed", &inputs.prev_seed, &mut input_issues);
        info!(
            "Normalized {} tens and {} ones patterns, {} tracked sets ({} inputs ignored)",
            tens.accepted.len(),
            ones.accepted.len(),
            tracked.accepted.len(),
            input_issues.len()
        );

        let generated = self.source.get_candidates(&tens.accepted, &ones.accepted);
        info!("Generated candidates (pre-filter): {}", generated.len());

        let mut pool = generated.clone();
        if self.config.inject_tracked {
            pool.extend(tracked.accepted.iter().copied());
            info!("Injected {} tracked combinations", pool.len() - generated.len());
        }

        let contexts = ContextBuilder::new(seed, prev_seed);
        let initial_cuts = self.registry.initial_counts(&pool, &contexts);
        info!(
            "Counted initial eliminations for {} filters in {:.2?}",
            initial_cuts.len(),
            start_time.elapsed()
        );

        Prepared {
            tens: tens.accepted,
            ones: ones.accepted,
            tracked: tracked.accepted,
            contexts,
            input_issues,
            generated,
            pool,
            initial_cuts,
        }
    }

    fn parse_seed(&self, input: &'static str, text: &str, issues: &mut Vec<InputIssue>) -> Option<Combination> {
        match parse_number_set(text) {
            Ok(seed) => seed,
            Err(error) => {
                warn!("Ignored invalid {}: {}", input, error);
                issues.push(InputIssue::new(input, &error));
                None
            }
        }
    }

    /// Registry indices in listing order: most initial cuts first, zero-cut
    /// filters last, ties in registry order. Zero-cut filters are dropped
    /// when `hide_zero_cuts` is set.
    pub fn listing(&self, initial_cuts: &[usize]) -> Vec<usize> {
        let mut ranked: Vec<usize> = (0..self.registry.len()).collect();
        ranked.sort_by_key(|&i| (initial_cuts[i] == 0, std::cmp::Reverse(initial_cuts[i]), i));
        if self.config.hide_zero_cuts {
            ranked.retain(|&i| initial_cuts[i] > 0);
        }
        ranked
    }

    /// Registry indices of the activated filters, in application order.
    fn activate(&self, listing: &[usize]) -> Result<Vec<usize>> {
        let filters = self.registry.filters();
        let bulk = |keep: &dyn Fn(&FilterRecord) -> bool| {
            let mut chosen: Vec<usize> = listing.iter().copied().filter(|&i| keep(filters[i].as_ref())).collect();
            if self.config.order == ActivationOrder::Registry {
                chosen.sort_unstable();
            }
            chosen
        };

        let activated = match &self.config.activation {
            Activation::None => Vec::new(),
            Activation::All => bulk(&|_| true),
            Activation::EnabledByDefault => bulk(&|f| f.enabled_default),
            Activation::Ids(ids) => {
                // later sources win for repeated ids
                let by_id: HashMap<&str, usize> =
                    filters.iter().enumerate().map(|(i, f)| (f.id.as_str(), i)).collect();
                let mut seen = HashSet::new();
                let mut chosen = Vec::with_capacity(ids.len());
                for id in ids {
                    let Some(&index) = by_id.get(id.as_str()) else {
                        bail!("Unknown filter id: {}", id);
                    };
                    if seen.insert(index) {
                        chosen.push(index);
                    }
                }
                chosen
            }
        };
        Ok(activated)
    }

    /// Listing for display without running any filter.
    pub fn survey(&self, inputs: &RunInputs) -> (Prepared, Vec<FilterSummary>) {
        let prepared = self.prepare(inputs);
        let summaries = self
            .listing(&prepared.initial_cuts)
            .into_iter()
            .map(|i| self.summary(i, prepared.initial_cuts[i]))
            .collect();
        (prepared, summaries)
    }

    fn summary(&self, index: usize, initial_cuts: usize) -> FilterSummary {
        let filter = &self.registry.filters()[index];
        FilterSummary {
            id: filter.id.clone(),
            name: filter.name.clone(),
            enabled_default: filter.enabled_default,
            initial_cuts,
            step: None,
            eliminated: None,
            preserved: None,
        }
    }

    /// Main entry point: one complete run.
    pub fn run(&self, inputs: &RunInputs) -> Result<RunReport> {
        let start_time = Instant::now();
        let prepared = self.prepare(inputs);

        let listing = self.listing(&prepared.initial_cuts);
        let activated = self.activate(&listing).context("Failed to activate filters")?;
        info!("Activated {} of {} filters", activated.len(), self.registry.len());

        let mut tracker = AuditTracker::new(
            &prepared.tracked,
            &prepared.generated,
            self.config.inject_tracked,
            self.config.preserve_tracked,
        );

        let pipeline = activated.iter().fold(FilterPipeline::new(), |pipeline, &i| {
            pipeline.add_shared(self.registry.filters()[i].clone())
        });
        let outcome = pipeline.apply(
            prepared.pool.iter().copied().collect(),
            &prepared.contexts,
            &mut tracker,
        );

        // activated filters always show, even when the listing hides them
        let passes: HashMap<usize, _> = activated.iter().copied().zip(&outcome.passes).collect();
        let shown = listing
            .iter()
            .chain(activated.iter().filter(|i| !listing.contains(i)));
        let filters: Vec<FilterSummary> = shown
            .map(|&i| {
                let mut summary = self.summary(i, prepared.initial_cuts[i]);
                if let Some(pass) = passes.get(&i) {
                    summary.step = Some(pass.order);
                    summary.eliminated = Some(pass.eliminated);
                    summary.preserved = Some(pass.preserved);
                }
                summary
            })
            .collect();

        let survivor_set: BTreeSet<Combination> = outcome.survivors.iter().copied().collect();
        let survivors = survivor_lines(&survivor_set, &tracker);
        let audit = tracker.rows(&survivor_set);

        let totals = RunTotals {
            tens_patterns: prepared.tens.len(),
            ones_patterns: prepared.ones.len(),
            tracked: tracker.len(),
            generated: prepared.generated.len(),
            injected: tracker.injected().count(),
            activated_filters: activated.len(),
            survivors: survivor_set.len(),
        };
        info!(
            "Remaining after filters: {} of {} (total time {:.2?})",
            totals.survivors,
            prepared.pool.len(),
            start_time.elapsed()
        );

        Ok(RunReport {
            totals,
            input_issues: prepared.input_issues,
            filters,
            survivors,
            audit,
        })
    }
}

/// Tracked survivors first, then the rest, each group ascending.
fn survivor_lines(survivors: &BTreeSet<Combination>, tracker: &AuditTracker) -> Vec<SurvivorLine> {
    let (tracked, untracked): (Vec<&Combination>, Vec<&Combination>) =
        survivors.iter().partition(|c| tracker.is_tracked(c));
    tracked
        .into_iter()
        .chain(untracked)
        .map(|combo| SurvivorLine {
            combo: *combo,
            tracked: tracker.is_tracked(combo),
            would_eliminate: tracker
                .entry(combo)
                .and_then(|e| e.would_eliminate_by())
                .cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTERS: &str = "\
id,name,applicable_if,expression,enabled
BIG,Big sum,,final_sum > 150,true
NONE,Never,,False,true
ODD,All odd,,final_odd_count == 5,false
";

    fn orchestrator(config: RunConfig) -> PairingOrchestrator {
        let mut registry = FilterRegistry::new();
        registry.load_from_reader(FILTERS.as_bytes(), "inline").unwrap();
        PairingOrchestrator::new(Arc::new(registry), config)
    }

    #[test]
    fn test_prepare_reports_bad_inputs() {
        let orch = orchestrator(RunConfig::default());
        let inputs = RunInputs::new("11566, 7", "57999 abc")
            .with_seed("1 2 3")
            .with_tracked("01-02-03-04-05 99-1-2-3-4");
        let prepared = orch.prepare(&inputs);

        assert_eq!(prepared.tens.len(), 1);
        assert_eq!(prepared.ones.len(), 1);
        assert_eq!(prepared.tracked.len(), 1);
        assert_eq!(prepared.generated.len(), 2);
        let sources: Vec<&str> = prepared.input_issues.iter().map(|i| i.input).collect();
        assert_eq!(sources, vec!["tens", "ones", "tracked", "seed"]);
    }

    #[test]
    fn test_listing_ranks_and_hides() {
        let orch = orchestrator(RunConfig::default());
        assert_eq!(orch.listing(&[1, 0, 3]), vec![2, 0]);

        let orch = orchestrator(RunConfig::default().with_hide_zero_cuts(false));
        assert_eq!(orch.listing(&[1, 0, 3]), vec![2, 0, 1]);
        assert_eq!(orch.listing(&[2, 0, 2]), vec![0, 2, 1]);
    }

    #[test]
    fn test_activation_modes() {
        let listing = vec![2, 0, 1];
        let config = RunConfig::default().with_activation(Activation::All);
        assert_eq!(orchestrator(config.clone()).activate(&listing).unwrap(), vec![0, 1, 2]);

        let ranked = config.with_order(ActivationOrder::InitialCuts);
        assert_eq!(orchestrator(ranked).activate(&listing).unwrap(), vec![2, 0, 1]);

        let enabled = RunConfig::default().with_activation(Activation::EnabledByDefault);
        assert_eq!(orchestrator(enabled).activate(&listing).unwrap(), vec![0, 1]);

        let ids = RunConfig::default().with_activation(Activation::Ids(vec![
            "ODD".into(),
            "BIG".into(),
            "ODD".into(),
        ]));
        assert_eq!(orchestrator(ids).activate(&listing).unwrap(), vec![2, 0]);

        let unknown = RunConfig::default().with_activation(Activation::Ids(vec!["NOPE".into()]));
        assert!(orchestrator(unknown).activate(&listing).is_err());

        assert!(orchestrator(RunConfig::default()).activate(&listing).unwrap().is_empty());
    }

    #[test]
    fn test_survivor_lines_put_tracked_first() {
        let a = Combination::new([1, 2, 3, 4, 5]).unwrap();
        let b = Combination::new([6, 7, 8, 9, 10]).unwrap();
        let survivors: BTreeSet<_> = [a, b].into_iter().collect();
        let tracker = AuditTracker::new(&[b], &survivors, false, true);

        let lines = survivor_lines(&survivors, &tracker);
        assert_eq!(lines[0].combo, b);
        assert!(lines[0].tracked);
        assert_eq!(lines[1].combo, a);
        assert!(!lines[1].tracked);
    }
}
