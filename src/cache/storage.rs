//! Key-value store implementations.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use super::traits::KeyValueStore;
use crate::config::{CacheBackend, CacheConfig};

/// Store that doesn't keep anything.
/// Used when caching is disabled in the configuration.
pub struct NoopStore;

impl KeyValueStore for NoopStore {
  fn get(&self, _key: &str) -> Result<Option<String>> {
    Ok(None) // Always miss
  }

  fn set(&self, _key: &str, _value: &str) -> Result<()> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
  entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let entries = self
      .entries
      .read()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut entries = self
      .entries
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut entries = self
      .entries
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.remove(key);
    Ok(())
  }
}

/// SQLite-backed persistent store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open or create the store at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a store that lives only as long as the value.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::with_connection(conn)
  }

  /// Default database path: `$XDG_DATA_HOME/stapling/cache.db`.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("stapling").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// When the entry under `key` was last written, as stored by SQLite.
  pub fn cached_at(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT cached_at FROM resource_cache WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry '{}': {}", key, e))
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
-- Raw resource text keyed by request URL
CREATE TABLE IF NOT EXISTS resource_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT value FROM resource_cache WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry '{}': {}", key, e))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO resource_cache (key, value, cached_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to store cache entry '{}': {}", key, e))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM resource_cache WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove cache entry '{}': {}", key, e))?;

    Ok(())
  }
}

/// The store selected by configuration.
pub enum ConfiguredStore {
  Sqlite(SqliteStore),
  Memory(MemoryStore),
  Noop(NoopStore),
}

impl ConfiguredStore {
  /// Open the backend named in `config`.
  pub fn open(config: &CacheConfig) -> Result<Self> {
    let store = match config.backend {
      CacheBackend::Sqlite => match &config.path {
        Some(path) => Self::Sqlite(SqliteStore::open_at(path)?),
        None => Self::Sqlite(SqliteStore::open()?),
      },
      CacheBackend::Memory => Self::Memory(MemoryStore::new()),
      CacheBackend::None => Self::Noop(NoopStore),
    };
    Ok(store)
  }

  /// When the entry under `key` was written. Only the sqlite backend
  /// records this; the others report `None`.
  pub fn cached_at(&self, key: &str) -> Result<Option<String>> {
    match self {
      Self::Sqlite(store) => store.cached_at(key),
      Self::Memory(_) | Self::Noop(_) => Ok(None),
    }
  }

  fn inner(&self) -> &dyn KeyValueStore {
    match self {
      Self::Sqlite(store) => store,
      Self::Memory(store) => store,
      Self::Noop(store) => store,
    }
  }
}

impl KeyValueStore for ConfiguredStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    self.inner().get(key)
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self.inner().set(key, value)
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.inner().remove(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exercise(store: &dyn KeyValueStore) {
    assert_eq!(store.get("a").unwrap(), None);

    store.set("a", "one").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("one"));

    store.set("a", "two").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("two"));

    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);

    // Removing twice is fine
    store.remove("a").unwrap();
  }

  #[test]
  fn test_memory_store() {
    exercise(&MemoryStore::new());
  }

  #[test]
  fn test_sqlite_store() {
    exercise(&SqliteStore::open_in_memory().unwrap());
  }

  #[test]
  fn test_sqlite_store_keeps_empty_values() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set("empty", "").unwrap();
    assert_eq!(store.get("empty").unwrap().as_deref(), Some(""));
  }

  #[test]
  fn test_sqlite_cached_at() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.cached_at("k").unwrap(), None);

    store.set("k", "v").unwrap();
    assert!(store.cached_at("k").unwrap().is_some());
  }

  #[test]
  fn test_configured_backends() {
    let memory = ConfiguredStore::open(&CacheConfig {
      backend: CacheBackend::Memory,
      path: None,
    })
    .unwrap();
    assert!(matches!(memory, ConfiguredStore::Memory(_)));
    exercise(&memory);
    memory.set("k", "v").unwrap();
    assert_eq!(memory.cached_at("k").unwrap(), None);

    let none = ConfiguredStore::open(&CacheConfig {
      backend: CacheBackend::None,
      path: None,
    })
    .unwrap();
    none.set("a", "one").unwrap();
    assert_eq!(none.get("a").unwrap(), None);
  }

  #[test]
  fn test_configured_sqlite_reports_cached_at() {
    let store = ConfiguredStore::Sqlite(SqliteStore::open_in_memory().unwrap());
    assert_eq!(store.cached_at("k").unwrap(), None);

    store.set("k", "v").unwrap();
    assert!(store.cached_at("k").unwrap().is_some());
  }

  #[test]
  fn test_noop_store_never_hits() {
    let store = NoopStore;
    store.set("a", "one").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
  }
}
