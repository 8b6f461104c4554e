//! Cryptographic operations for Solana keypair generation.
//!
//! This module provides:
//! - Ed25519 key generation from the OS random source
//! - Base58 encoding of public keys and 64-byte secrets
//! - The `KeyGenerator` seam used by the searcher and the scheduler

mod generator;
mod keypair;

pub use generator::{Ed25519Generator, KeyGenerator};
pub use keypair::Keypair;
