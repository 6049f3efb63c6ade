//! Example: Generate candidates from tens and ones survivors
//!
//! Run with: cargo run --package sources --example generate_candidates
//!
//! This example shows how to:
//! 1. Normalize raw tens / ones survivor text
//! 2. Expand a single pattern pair
//! 3. Generate the full candidate pool
//! 4. Display the results

use data_loader::{normalize_ones, normalize_tens};
use sources::PairingSource;
use std::time::Instant;

const TENS: &str = "11566\n12345, 02356\n1234\n";
const ONES: &str = "57999\n13579 24680\n";

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .init();

    println!("=== Final Pairing Candidate Generation Example ===\n");

    let tens = normalize_tens(TENS);
    let ones = normalize_ones(ONES);
    println!("Tens patterns: {}", tens.accepted.len());
    println!("Ones patterns: {}", ones.accepted.len());
    for bad in tens.rejected.iter().chain(&ones.rejected) {
        println!("  ignored {}", bad);
    }

    let source = PairingSource::new();

    println!("\n--- Single pair: {} x {} ---", tens.accepted[0], ones.accepted[0]);
    for combo in source.expand_pair(&tens.accepted[0], &ones.accepted[0]) {
        println!("  {}", combo);
    }

    let start = Instant::now();
    let candidates = source.get_candidates(&tens.accepted, &ones.accepted);
    println!(
        "\nGenerated {} candidates in {:?}",
        candidates.len(),
        start.elapsed()
    );
    for combo in candidates.iter().take(10) {
        println!("  {}", combo);
    }
}
