//! Best-effort access to a key-value store.

use std::sync::Arc;

use super::traits::{KeyValueStore, Resources};

/// Key used by [`StoreAdapter::is_supported`] to probe the store.
///
/// Contains spaces and has no scheme, so it never collides with a resource URL.
const PROBE_KEY: &str = "<stapling support probe>";

/// Wraps a store so that no storage failure ever reaches the caller.
///
/// A failed read is a miss, a failed write or removal is a no-op. Failures
/// are logged at debug level.
pub struct StoreAdapter<S: KeyValueStore> {
  store: Arc<S>,
}

impl<S: KeyValueStore> StoreAdapter<S> {
  pub fn new(store: S) -> Self {
    Self {
      store: Arc::new(store),
    }
  }

  /// The wrapped store.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Read a cached resource. Failures read as absent.
  pub fn try_get(&self, key: &str) -> Option<String> {
    match self.store.get(key) {
      Ok(value) => value,
      Err(e) => {
        tracing::debug!(key, "Cache read failed: {}", e);
        None
      }
    }
  }

  /// Store a resource, ignoring failures.
  pub fn try_set(&self, key: &str, value: &str) {
    if let Err(e) = self.store.set(key, value) {
      tracing::debug!(key, "Cache write failed: {}", e);
    }
  }

  /// Remove one or many resources, ignoring failures.
  ///
  /// A failure on one key doesn't stop the remaining removals.
  pub fn try_remove(&self, keys: impl Into<Resources>) {
    for key in keys.into().iter() {
      if let Err(e) = self.store.remove(key) {
        tracing::debug!(key, "Cache removal failed: {}", e);
      }
    }
  }

  /// Whether an entry for `key` is currently readable.
  pub fn contains(&self, key: &str) -> bool {
    self.try_get(key).is_some()
  }

  /// Probe whether the store actually persists values.
  ///
  /// Writes and removes a reserved key; entries under any other key are
  /// left alone.
  pub fn is_supported(&self) -> bool {
    let written = self.store.set(PROBE_KEY, "1").is_ok();
    let read_back = matches!(self.store.get(PROBE_KEY), Ok(Some(ref v)) if v == "1");
    let _ = self.store.remove(PROBE_KEY);
    written && read_back
  }
}

impl<S: KeyValueStore> Clone for StoreAdapter<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryStore, NoopStore};
  use color_eyre::{eyre::eyre, Result};

  /// Store where every operation fails, like a full or disabled storage area.
  struct BrokenStore;

  impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
      Err(eyre!("storage disabled"))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
      Err(eyre!("quota exceeded"))
    }

    fn remove(&self, _key: &str) -> Result<()> {
      Err(eyre!("security error"))
    }
  }

  #[test]
  fn test_round_trip() {
    let adapter = StoreAdapter::new(MemoryStore::new());
    assert_eq!(adapter.try_get("k"), None);

    adapter.try_set("k", "v");
    assert_eq!(adapter.try_get("k").as_deref(), Some("v"));
    assert!(adapter.contains("k"));
  }

  #[test]
  fn test_failures_are_swallowed() {
    let adapter = StoreAdapter::new(BrokenStore);
    adapter.try_set("k", "v");
    adapter.try_remove("k");
    adapter.try_remove(["a", "b"]);
    assert_eq!(adapter.try_get("k"), None);
    assert!(!adapter.contains("k"));
  }

  #[test]
  fn test_remove_many() {
    let adapter = StoreAdapter::new(MemoryStore::new());
    adapter.try_set("a", "1");
    adapter.try_set("b", "2");
    adapter.try_set("c", "3");

    adapter.try_remove(["a", "b"]);
    assert!(!adapter.contains("a"));
    assert!(!adapter.contains("b"));
    assert!(adapter.contains("c"));
  }

  #[test]
  fn test_is_supported() {
    assert!(StoreAdapter::new(MemoryStore::new()).is_supported());
    assert!(!StoreAdapter::new(NoopStore).is_supported());
    assert!(!StoreAdapter::new(BrokenStore).is_supported());
  }

  #[test]
  fn test_probe_leaves_no_entry() {
    let adapter = StoreAdapter::new(MemoryStore::new());
    adapter.is_supported();
    assert!(!adapter.contains(PROBE_KEY));
  }

  #[test]
  fn test_probe_key_is_not_a_url() {
    assert!(url::Url::parse(PROBE_KEY).is_err());

    let adapter = StoreAdapter::new(MemoryStore::new());
    adapter.try_set("http://h/t.xsl", "<xsl/>");
    assert!(adapter.is_supported());
    assert_eq!(adapter.try_get("http://h/t.xsl").as_deref(), Some("<xsl/>"));
  }

  #[test]
  fn test_clones_share_the_store() {
    let adapter = StoreAdapter::new(MemoryStore::new());
    let other = adapter.clone();
    adapter.try_set("k", "v");
    assert!(other.contains("k"));
  }
}
