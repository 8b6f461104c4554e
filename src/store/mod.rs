//! Persistent keypair inventory.
//!
//! - [`Inventory`] - The async trait producers and consumers share
//! - [`SqliteInventory`] - SQLite-backed storage
//! - [`MemoryInventory`] - In-memory storage for tests
//!
//! The store is the only shared mutable state in the process and is
//! responsible for its own concurrency control.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryInventory;
pub use sqlite::{SqliteInventory, StoreLocation};
pub use traits::{Inventory, InventoryRecord};

/// Current time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
