//! Inventory trait: the abstract interface for keypair persistence.
//!
//! Generation streams append to it; the API drains it. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;

use crate::category::Category;
use crate::crypto::Keypair;

use super::error::Result;

/// A stored keypair. Never mutated; removed only by `drain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    /// Store-assigned id, increasing in insertion order.
    pub id: i64,
    /// The partition this record belongs to (`Category::name()`).
    pub category: String,
    pub keypair: Keypair,
    /// Unix ms.
    pub created_at: i64,
}

/// Async interface for the keypair inventory.
///
/// # Concurrency
///
/// Implementations do their own locking; callers never coordinate.
/// `drain` selects and removes as one atomic step: no record is returned
/// by two drains, and no returned record stays available. Removal is
/// scoped to exactly the records selected, so a concurrent `append` is
/// either drained or left in place, never lost.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Durably store a new record. Never overwrites.
    async fn append(&self, category: &Category, keypair: Keypair) -> Result<InventoryRecord>;

    /// Remove and return up to `limit` records of `category`.
    ///
    /// Unfiltered categories are sampled uniformly at random; vanity
    /// categories are returned oldest first. Fewer than `limit`
    /// available records is not an error.
    async fn drain(&self, category: &Category, limit: usize) -> Result<Vec<InventoryRecord>>;

    /// Number of records currently available in `category`.
    async fn available(&self, category: &Category) -> Result<usize>;
}
