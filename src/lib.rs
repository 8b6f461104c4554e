//! # sol_vanity_pool
//!
//! Continuously generates Solana keypairs, keeps the ones matching each
//! configured criterion, and hands them out through a drain-on-read API.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation and base58 encoding
//! - `matcher`: Suffix predicates
//! - `category`: Inventory partitions and their selection policy
//! - `worker`: Vanity search and self-rescheduling generation streams
//! - `store`: The inventory (SQLite and in-memory)
//! - `api`: HTTP routes over the inventory
//! - `config`: Runtime configuration

pub mod api;
pub mod category;
pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod store;
pub mod worker;

pub use category::{Category, Selection, VanityTarget};
pub use config::Config;
pub use crypto::{Ed25519Generator, KeyGenerator, Keypair};
pub use error::{Error, Result};
pub use matcher::{MatchResult, Pattern, PatternType};
pub use store::{Inventory, InventoryRecord, MemoryInventory, SqliteInventory, StoreError};
pub use worker::{GenerationScheduler, StreamSpec, VanitySearcher};
