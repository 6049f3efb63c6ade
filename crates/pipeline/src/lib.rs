//! Elimination pipeline for paired candidate combinations.
//!
//! This crate provides:
//! - `ContextBuilder` / `EvaluationContext`: per-combination features
//! - `expr`: the predicate language filter rules are written in
//! - `FilterRegistry`: filter records loaded from CSV
//! - `FilterPipeline`: the sequential elimination engine
//! - `AuditTracker`: what happened to each tracked combination
//!
//! ## Architecture
//! 1. The registry compiles every record once at load time
//! 2. Initial elimination counts rank filters against the full candidate set
//! 3. Activated filters run in order; each sees only earlier survivors
//! 4. The tracker credits the first filter to match a tracked combination
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{AuditTracker, ContextBuilder, FilterPipeline, FilterRegistry};
//!
//! let (registry, report) = FilterRegistry::load_from_paths(&["filters.csv"])?;
//! let contexts = ContextBuilder::new(seed, prev_seed);
//! let mut tracker = AuditTracker::new(&tracked, &candidates, false, true);
//!
//! let pipeline = registry
//!     .filters()
//!     .iter()
//!     .fold(FilterPipeline::new(), |p, f| p.add_shared(f.clone()));
//! let outcome = pipeline.apply(candidates.into_iter().collect(), &contexts, &mut tracker);
//! ```

pub mod audit;
pub mod context;
pub mod error;
pub mod expr;
pub mod filter_pipeline;
pub mod registry;
pub mod traits;

// Re-export main types
pub use audit::{AuditEntry, AuditRow, AuditTracker, Fate, Strike};
pub use context::{ContextBuilder, EvaluationContext, Feature, shared_numbers};
pub use error::{EvalError, ParseError, RegistryError};
pub use expr::{Predicate, Value};
pub use filter_pipeline::{FilterPipeline, PassSummary, PipelineOutcome};
pub use registry::{FilterRecord, FilterRegistry, LoadReport, RejectedFilter};
pub use traits::Filter;
