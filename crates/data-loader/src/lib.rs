//! # Data Loader Crate
//!
//! Domain types and raw-text normalization for final-pairing.
//!
//! ## Main Components
//!
//! - **types**: `DigitPattern`, `Vocabulary`, `Combination`
//! - **parser**: normalizers for tens/ones survivor lists, tracked sets, and seeds
//! - **error**: `InputError`, the reason a token was rejected
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{normalize_tens, normalize_ones};
//!
//! let tens = normalize_tens("11566\n12345");
//! let ones = normalize_ones("57999");
//! for bad in &tens.rejected {
//!     eprintln!("ignored: {}", bad);
//! }
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;

// Re-export commonly used types for convenience
pub use error::{InputError, Result};
pub use parser::{
    Normalized,
    extract_numbers,
    normalize_finals,
    normalize_ones,
    normalize_patterns,
    normalize_tens,
    parse_number_set,
};
pub use types::{
    Combination,
    DigitPattern,
    Vocabulary,
    // Constants
    LOW_MAX,
    MAX_NUMBER,
    MIN_NUMBER,
    PICK,
};
