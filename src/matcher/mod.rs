//! Pattern matching for Solana public keys.
//!
//! Supports two strategies:
//! - Any: every generated keypair is kept
//! - Suffix: the base58 public key must end with the target

mod pattern;

pub use pattern::{
    validate_suffix, MatchResult, Pattern, PatternType, BASE58_ALPHABET, MAX_IDENTIFIER_LEN,
};
