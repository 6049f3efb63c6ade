//! Orchestration for final-pairing runs.
//!
//! `PairingOrchestrator` ties the crates together: it normalizes raw text
//! with `data_loader`, expands candidates with `sources`, and filters them
//! with `pipeline`, producing a serializable `RunReport`.

pub mod config;
pub mod orchestrator;
pub mod report;

pub use config::{Activation, ActivationOrder, RunConfig, RunInputs};
pub use orchestrator::{PairingOrchestrator, Prepared};
pub use report::{FilterSummary, InputIssue, RunReport, RunTotals, SurvivorLine};
