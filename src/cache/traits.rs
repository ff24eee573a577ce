//! Core traits and types for the caching system.

use color_eyre::Result;

/// A persistent string store.
///
/// Every operation may fail (disk full, store unavailable, ...). Callers go
/// through [`super::StoreAdapter`], which turns failures into misses and no-ops.
pub trait KeyValueStore: Send + Sync {
  /// Read the value stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> Result<()>;
}

/// One resource URL or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resources {
  One(String),
  Many(Vec<String>),
}

impl Resources {
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    let slice = match self {
      Self::One(url) => std::slice::from_ref(url),
      Self::Many(urls) => urls.as_slice(),
    };
    slice.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    match self {
      Self::One(_) => 1,
      Self::Many(urls) => urls.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl From<&str> for Resources {
  fn from(url: &str) -> Self {
    Self::One(url.to_string())
  }
}

impl From<String> for Resources {
  fn from(url: String) -> Self {
    Self::One(url)
  }
}

impl From<&String> for Resources {
  fn from(url: &String) -> Self {
    Self::One(url.clone())
  }
}

impl From<Vec<String>> for Resources {
  fn from(urls: Vec<String>) -> Self {
    Self::Many(urls)
  }
}

impl From<Vec<&str>> for Resources {
  fn from(urls: Vec<&str>) -> Self {
    Self::Many(urls.into_iter().map(String::from).collect())
  }
}

impl From<&[&str]> for Resources {
  fn from(urls: &[&str]) -> Self {
    Self::Many(urls.iter().map(|u| u.to_string()).collect())
  }
}

impl<const N: usize> From<[&str; N]> for Resources {
  fn from(urls: [&str; N]) -> Self {
    Self::Many(urls.iter().map(|u| u.to_string()).collect())
  }
}

/// Where a resource's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Read from the store
  Cache,
  /// Fetched over the network
  Network,
}
