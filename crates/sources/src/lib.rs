//! # Sources Crate
//!
//! Candidate generation for final-pairing.
//!
//! ## Components
//!
//! ### Pairing Source
//! Expands every (tens pattern, ones pattern) pair into the 5-number
//! combinations it describes:
//! - the tens digits stay in canonical order
//! - the ones digits are permuted over their distinct arrangements
//! - tuples with a number outside 1..=69 or a repeated number are dropped
//!
//! ### Distinct Permutations
//! Lexicographic permutation walk over a multiset, so repeated digits
//! (e.g. `57999`) are never expanded twice.
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{normalize_ones, normalize_tens};
//! use sources::PairingSource;
//!
//! let tens = normalize_tens("11566\n12345");
//! let ones = normalize_ones("57999");
//! let candidates = PairingSource::new().get_candidates(&tens.accepted, &ones.accepted);
//! ```

// Public modules
pub mod permutations;
pub mod pairing;

// Re-export commonly used types
pub use pairing::{CandidateSet, PairingSource};
pub use permutations::DistinctPermutations;
