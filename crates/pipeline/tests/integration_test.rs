//! Integration tests for the pipeline.
//!
//! These tests load filters from CSV, expand real patterns, and check that
//! the engine and audit tracker agree on what happened.

use data_loader::{Combination, normalize_ones, normalize_tens};
use pipeline::{AuditTracker, ContextBuilder, FilterPipeline, FilterRegistry, Fate};
use sources::PairingSource;
use std::collections::BTreeSet;
use std::io::Write;

const FILTERS: &str = "\
id,name,applicable_if,expression,enabled
HIGH,High sum,True,final_sum > 300,true
ODD,Five odd,,final_odd_count == 5,true
LOW,Low range,,final_range < 10,false
";

fn combo(numbers: [u8; 5]) -> Combination {
    Combination::new(numbers).unwrap()
}

fn registry(csv: &str) -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    registry.load_from_reader(csv.as_bytes(), "inline").unwrap();
    registry
}

fn pipeline_for(registry: &FilterRegistry, ids: &[&str]) -> FilterPipeline {
    ids.iter().fold(FilterPipeline::new(), |pipeline, id| {
        let filter = registry
            .filters()
            .iter()
            .find(|f| f.id == *id)
            .unwrap()
            .clone();
        pipeline.add_shared(filter)
    })
}

#[test]
fn test_sum_threshold_scenario() {
    let registry = registry(FILTERS);
    let low = combo([1, 2, 3, 4, 5]);
    let high = combo([60, 61, 62, 63, 65]);
    let mut tracker = AuditTracker::default();

    let outcome = pipeline_for(&registry, &["HIGH"]).apply(
        vec![low, high],
        &ContextBuilder::default(),
        &mut tracker,
    );
    assert_eq!(outcome.survivors, vec![low]);
}

#[test]
fn test_first_eliminator_wins() {
    let registry = registry(FILTERS);
    // sum 325 and all odd: both HIGH and ODD match
    let a = combo([61, 63, 65, 67, 69]);
    let generated: BTreeSet<_> = [a].into_iter().collect();

    for (order, expected) in [(["HIGH", "ODD"], "HIGH"), (["ODD", "HIGH"], "ODD")] {
        let mut tracker = AuditTracker::new(&[a], &generated, false, false);
        let outcome = pipeline_for(&registry, &order).apply(
            vec![a],
            &ContextBuilder::default(),
            &mut tracker,
        );
        assert!(outcome.survivors.is_empty());
        let strike = tracker.entry(&a).unwrap().eliminated_by().unwrap();
        assert_eq!(strike.filter_id, expected);
        assert_eq!(strike.order, 1);
    }
}

#[test]
fn test_preservation_on_and_off() {
    let registry = registry(FILTERS);
    let tracked = combo([61, 63, 65, 67, 69]);
    let other = combo([1, 3, 5, 7, 9]);
    let candidates = vec![other, tracked];
    let generated: BTreeSet<_> = candidates.iter().copied().collect();
    let filters = ["LOW", "ODD", "HIGH"];

    let mut preserving = AuditTracker::new(&[tracked], &generated, false, true);
    let outcome = pipeline_for(&registry, &filters).apply(
        candidates.clone(),
        &ContextBuilder::default(),
        &mut preserving,
    );
    assert_eq!(outcome.survivors, vec![tracked]);
    let entry = preserving.entry(&tracked).unwrap();
    assert!(entry.eliminated_by().is_none());
    let would = entry.would_eliminate_by().unwrap();
    assert_eq!((would.filter_id.as_str(), would.order), ("LOW", 1));

    let mut removing = AuditTracker::new(&[tracked], &generated, false, false);
    let outcome = pipeline_for(&registry, &filters).apply(
        candidates,
        &ContextBuilder::default(),
        &mut removing,
    );
    assert!(outcome.survivors.is_empty());
    let entry = removing.entry(&tracked).unwrap();
    assert!(entry.would_eliminate_by().is_none());
    assert_eq!(entry.eliminated_by().unwrap().filter_id, "LOW");
}

#[test]
fn test_not_generated_and_not_injected_never_survives() {
    let registry = registry(FILTERS);
    let tens = normalize_tens("11566");
    let ones = normalize_ones("57999");
    let generated = PairingSource::new().get_candidates(&tens.accepted, &ones.accepted);

    let stranger = combo([1, 2, 3, 4, 5]);
    let mut tracker = AuditTracker::new(&[stranger], &generated, false, true);
    assert_eq!(tracker.injected().count(), 0);

    let outcome = pipeline_for(&registry, &[]).apply(
        generated.iter().copied().collect(),
        &ContextBuilder::default(),
        &mut tracker,
    );
    let survivors: BTreeSet<_> = outcome.survivors.into_iter().collect();
    let rows = tracker.rows(&survivors);

    assert_eq!(rows.len(), 1);
    assert!(!rows[0].generated);
    assert!(!rows[0].injected);
    assert!(!rows[0].survived);
    assert_eq!(tracker.entry(&stranger).unwrap().fate(), &Fate::Untouched);
}

#[test]
fn test_expanded_candidates_through_csv_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "\u{feff}FID,NAME,EXPRESSION,ENABLED\nS1,Shares seed,\"shared_numbers(combo_numbers, seed_numbers) >= 2\",TRUE\nX,Unknown,missing_feature > 0,TRUE\n"
    )
    .unwrap();
    let (registry, report) = FilterRegistry::load_from_paths(&[file.path()]).unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(report.unknown_names.len(), 1);

    let tens = normalize_tens("11566");
    let ones = normalize_ones("57999");
    let generated = PairingSource::new().get_candidates(&tens.accepted, &ones.accepted);
    assert_eq!(generated.len(), 2);

    let seed = Some(combo([19, 59, 1, 2, 3]));
    let contexts = ContextBuilder::new(seed, None);
    assert_eq!(registry.initial_counts(&generated, &contexts), vec![2, 0]);

    let mut tracker = AuditTracker::default();
    let outcome = pipeline_for(&registry, &["X", "S1"]).apply(
        generated.iter().copied().collect(),
        &contexts,
        &mut tracker,
    );
    assert!(outcome.survivors.is_empty());
    assert_eq!(outcome.passes[0].eval_errors, 2);
    assert_eq!(outcome.passes[1].eliminated, 2);
}

#[test]
fn test_runs_are_deterministic() {
    let registry = registry(FILTERS);
    let tens = normalize_tens("01234 12345 23456");
    let ones = normalize_ones("13579 02468");
    let generated = PairingSource::new().get_candidates(&tens.accepted, &ones.accepted);
    let tracked: Vec<_> = generated.iter().step_by(7).copied().collect();

    let run = || {
        let mut tracker = AuditTracker::new(&tracked, &generated, false, true);
        let outcome = pipeline_for(&registry, &["ODD", "LOW", "HIGH"]).apply(
            generated.iter().copied().collect(),
            &ContextBuilder::default(),
            &mut tracker,
        );
        let survivors: BTreeSet<_> = outcome.survivors.iter().copied().collect();
        (outcome, tracker.rows(&survivors))
    };

    assert_eq!(run(), run());
}
