//! Elimination Engine.
//!
//! Runs activated filters one at a time over a shrinking candidate pool.
//! Each filter sees only the survivors of the filters before it, so the
//! order filters are added in decides which one is credited for removing a
//! given combination.

use crate::audit::AuditTracker;
use crate::context::ContextBuilder;
use crate::traits::Filter;
use data_loader::Combination;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of one filter's pass over the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub filter_id: String,
    pub filter_name: String,
    /// 1-based step index
    pub order: usize,
    /// Pool size when this filter started
    pub input: usize,
    /// Combinations actually removed
    pub eliminated: usize,
    /// Tracked combinations kept by the preservation policy
    pub preserved: usize,
    /// Evaluations that failed and were counted as non-matches
    pub eval_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Surviving pool, in input order
    pub survivors: Vec<Combination>,
    pub passes: Vec<PassSummary>,
}

/// Ordered chain of filters.
///
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(high_sum)
///     .add_shared(registry.filters()[3].clone());
///
/// let outcome = pipeline.apply(candidates, &contexts, &mut tracker);
/// ```
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter (builder pattern).
    pub fn add_filter(self, filter: impl Filter + 'static) -> Self {
        self.add_shared(Arc::new(filter))
    }

    /// Append a filter that is also held elsewhere, e.g. by the registry.
    pub fn add_shared(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply every filter in sequence.
    ///
    /// A match removes the combination unless the tracker preserves it, in
    /// which case only the would-be elimination is recorded. Evaluation
    /// errors count as "does not match" and never abort the pass.
    #[instrument(skip_all, fields(filters = self.filters.len(), candidates = candidates.len()))]
    pub fn apply(
        &self,
        candidates: Vec<Combination>,
        contexts: &ContextBuilder,
        tracker: &mut AuditTracker,
    ) -> PipelineOutcome {
        let mut pool = candidates;
        let mut passes = Vec::with_capacity(self.filters.len());

        for (index, filter) in self.filters.iter().enumerate() {
            let order = index + 1;
            let mut summary = PassSummary {
                filter_id: filter.id().to_string(),
                filter_name: filter.name().to_string(),
                order,
                input: pool.len(),
                eliminated: 0,
                preserved: 0,
                eval_errors: 0,
            };

            let mut kept = Vec::with_capacity(pool.len());
            for combo in pool {
                let matched = match filter.matches(&contexts.build(&combo)) {
                    Ok(matched) => matched,
                    Err(_) => {
                        summary.eval_errors += 1;
                        false
                    }
                };

                if !matched {
                    kept.push(combo);
                    continue;
                }

                tracker.record_match(&combo, filter.id(), filter.name(), order);
                if tracker.preserves(&combo) {
                    summary.preserved += 1;
                    kept.push(combo);
                } else {
                    summary.eliminated += 1;
                }
            }
            pool = kept;

            debug!(
                "Filter {} (step {}): {} -> {} ({} preserved, {} eval errors)",
                summary.filter_id,
                order,
                summary.input,
                pool.len(),
                summary.preserved,
                summary.eval_errors
            );
            passes.push(summary);
        }

        info!("Elimination finished: {} survivors", pool.len());
        PipelineOutcome {
            survivors: pool,
            passes,
        }
    }
}
