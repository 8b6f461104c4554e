//! SQLite implementation of the Inventory trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::debug;

use crate::category::{Category, Selection};
use crate::crypto::Keypair;

use super::error::{Result, StoreError};
use super::migration;
use super::now_millis;
use super::traits::{Inventory, InventoryRecord};

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// SQLite-backed inventory.
///
/// One connection behind a mutex; every operation runs on the blocking
/// pool so the async runtime never waits on disk I/O.
pub struct SqliteInventory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInventory {
    /// Open the database at `location`, creating it and running migrations.
    pub fn open(location: &StoreLocation) -> Result<Self> {
        match location {
            StoreLocation::File(path) => Self::open_path(path),
            StoreLocation::Memory => Self::open_memory(),
        }
    }

    /// Open a SQLite database file, creating parent directories as needed.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.display(), "opened sqlite inventory");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {}", e)))?
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryRecord> {
    let public_key: String = row.get("public_key")?;
    let private_key: String = row.get("private_key")?;

    Ok(InventoryRecord {
        id: row.get("id")?,
        category: row.get("category")?,
        keypair: Keypair::new(public_key, private_key),
        created_at: row.get("created_at")?,
    })
}

fn select_query(selection: Selection) -> &'static str {
    match selection {
        Selection::Random => {
            "SELECT id, category, public_key, private_key, created_at
             FROM keypairs WHERE category = ?1 ORDER BY RANDOM() LIMIT ?2"
        }
        Selection::Oldest => {
            "SELECT id, category, public_key, private_key, created_at
             FROM keypairs WHERE category = ?1 ORDER BY id LIMIT ?2"
        }
    }
}

#[async_trait]
impl Inventory for SqliteInventory {
    async fn append(&self, category: &Category, keypair: Keypair) -> Result<InventoryRecord> {
        let category = category.name().to_string();

        self.with_conn(move |conn| {
            let created_at = now_millis();
            conn.execute(
                "INSERT INTO keypairs (category, public_key, private_key, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![category, keypair.public_key(), keypair.secret_key(), created_at],
            )?;

            Ok(InventoryRecord {
                id: conn.last_insert_rowid(),
                category,
                keypair,
                created_at,
            })
        })
        .await
    }

    async fn drain(&self, category: &Category, limit: usize) -> Result<Vec<InventoryRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let name = category.name().to_string();
        let selection = category.selection();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            // IMMEDIATE takes the write lock up front so the select and the
            // delete see the same snapshot.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let records = {
                let mut stmt = tx.prepare(select_query(selection))?;
                let rows = stmt.query_map(params![name, limit], row_to_record)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            {
                let mut delete = tx.prepare("DELETE FROM keypairs WHERE id = ?1")?;
                for record in &records {
                    if delete.execute(params![record.id])? != 1 {
                        return Err(StoreError::InvalidData(format!(
                            "record {} disappeared during drain",
                            record.id
                        )));
                    }
                }
            }

            tx.commit()?;
            Ok(records)
        })
        .await
    }

    async fn available(&self, category: &Category) -> Result<usize> {
        let name = category.name().to_string();

        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM keypairs WHERE category = ?1",
                params![name],
                |row| row.get(0),
            )?;
            usize::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative count {}", count)))
        })
        .await
    }
}
