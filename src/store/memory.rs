//! In-memory implementation of the Inventory trait.
//!
//! Same semantics as SQLite with no persistence. Used by tests and by
//! callers that want a throwaway inventory.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::index;

use crate::category::{Category, Selection};
use crate::crypto::Keypair;

use super::error::{Result, StoreError};
use super::now_millis;
use super::traits::{Inventory, InventoryRecord};

/// In-memory inventory. All data is lost when dropped.
#[derive(Default)]
pub struct MemoryInventory {
    inner: Mutex<MemoryInventoryInner>,
}

#[derive(Default)]
struct MemoryInventoryInner {
    next_id: i64,
    /// Records per partition, in insertion order.
    partitions: HashMap<String, Vec<InventoryRecord>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInventoryInner>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn append(&self, category: &Category, keypair: Keypair) -> Result<InventoryRecord> {
        let mut inner = self.lock()?;
        inner.next_id += 1;

        let record = InventoryRecord {
            id: inner.next_id,
            category: category.name().to_string(),
            keypair,
            created_at: now_millis(),
        };

        inner
            .partitions
            .entry(record.category.clone())
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    async fn drain(&self, category: &Category, limit: usize) -> Result<Vec<InventoryRecord>> {
        let mut inner = self.lock()?;
        let Some(records) = inner.partitions.get_mut(category.name()) else {
            return Ok(Vec::new());
        };

        let amount = limit.min(records.len());
        match category.selection() {
            Selection::Oldest => Ok(records.drain(..amount).collect()),
            Selection::Random => {
                let picked = index::sample(&mut rand::thread_rng(), records.len(), amount).into_vec();

                // Remove from the back so earlier indices stay valid.
                let mut by_position = picked.clone();
                by_position.sort_unstable_by(|a, b| b.cmp(a));
                let mut removed: HashMap<usize, InventoryRecord> = by_position
                    .into_iter()
                    .map(|i| (i, records.remove(i)))
                    .collect();

                Ok(picked
                    .into_iter()
                    .filter_map(|i| removed.remove(&i))
                    .collect())
            }
        }
    }

    async fn available(&self, category: &Category) -> Result<usize> {
        let inner = self.lock()?;
        Ok(inner
            .partitions
            .get(category.name())
            .map_or(0, |records| records.len()))
    }
}
