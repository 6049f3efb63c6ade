//! Core traits for the elimination pipeline.
//!
//! This module defines the Filter trait that lets rule-driven filters
//! (loaded from CSV) and hand-written ones run through the same engine.

use crate::context::EvaluationContext;
use crate::error::EvalError;

/// A single elimination rule.
///
/// ## Design Note
/// - `Send + Sync` allows initial elimination counts to be computed in parallel
/// - `matches` is pure: it may fail, but it must not change any state
pub trait Filter: Send + Sync {
    /// Identifier credited in the audit trail
    fn id(&self) -> &str;

    /// Human-readable name (for logging/audit display)
    fn name(&self) -> &str;

    /// Whether this filter would eliminate the combination described by `context`.
    ///
    /// # Returns
    /// * `Ok(true)` - the combination should be removed
    /// * `Ok(false)` - the filter does not apply or does not match
    /// * `Err` - evaluation failed; callers treat this as no match
    fn matches(&self, context: &EvaluationContext) -> Result<bool, EvalError>;
}
