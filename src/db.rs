//! Timeline cache: durable per-timeline items, cursor and selection
//!
//! Entries live in a `SQLite` database, one row per timeline identity. Each
//! save replaces the row inside a transaction, so a crash mid-write leaves
//! the previous entry intact.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{Cursor, Item, TimelineIdentity};
use crate::paths;

/// Current entry format version, stored next to each row
const ENTRY_VERSION: i64 = 1;

/// Why the cache could not be written
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database rejected the operation
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The entry could not be encoded
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The cache file or its directory is unusable
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted state of one timeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Items in timeline order
    #[serde(default)]
    pub items: Vec<Item>,
    /// Pagination tokens
    #[serde(default)]
    pub cursor: Cursor,
    /// Selected row
    #[serde(default)]
    pub selected_index: usize,
}

/// Durable key-value persistence of timelines
pub trait CacheStore {
    /// Load the entry for `identity`.
    ///
    /// A missing, unreadable or corrupt entry is reported as `None`.
    fn load(&self, identity: &TimelineIdentity) -> Option<CacheEntry>;

    /// Replace the entry for `identity`
    fn save(&self, identity: &TimelineIdentity, entry: &CacheEntry) -> Result<(), StorageError>;
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the cache at the default location
    pub fn open() -> anyhow::Result<Self> {
        let path = paths::cache_path()?;
        Ok(Self::open_path(&path)?)
    }

    /// Open or create the cache at a specific path
    pub fn open_path(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// In-memory cache, nothing reaches the disk
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS timeline_cache (
                identity TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                entry_json TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    /// Remove the entry for a timeline
    pub fn delete(&self, identity: &TimelineIdentity) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM timeline_cache WHERE identity = ?1",
            params![identity.key()],
        )?;
        Ok(())
    }

    /// Drop thread entries older than `max_age_hours`; feeds are kept
    pub fn clear_old_threads(&self, max_age_hours: u64) -> Result<usize, StorageError> {
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours as i64);
        let count = self.conn.execute(
            "DELETE FROM timeline_cache WHERE identity LIKE 'thread:%' AND saved_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(count)
    }

    fn read_row(&self, identity: &TimelineIdentity) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT entry_json FROM timeline_cache WHERE identity = ?1",
                params![identity.key()],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }
}

impl CacheStore for Database {
    fn load(&self, identity: &TimelineIdentity) -> Option<CacheEntry> {
        let json = match self.read_row(identity) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read cache entry for {}: {}", identity, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&json) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry for {}: {}", identity, e);
                None
            }
        }
    }

    fn save(&self, identity: &TimelineIdentity, entry: &CacheEntry) -> Result<(), StorageError> {
        let json = serde_json::to_string(entry)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"INSERT OR REPLACE INTO timeline_cache (identity, version, entry_json, saved_at)
               VALUES (?1, ?2, ?3, ?4)",
            params![identity.key(), ENTRY_VERSION, json, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        tracing::debug!("Saved {} items for {}", entry.items.len(), identity);
        Ok(())
    }
}
