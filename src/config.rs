use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::fetch::DEFAULT_CACHE_PARAM;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Whether fetched resources are stored and cached ones reused
  pub cachable: bool,
  pub cache: CacheConfig,
  pub http: HttpConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      cachable: true,
      cache: CacheConfig::default(),
      http: HttpConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// SQLite database on disk
  #[default]
  Sqlite,
  /// Kept in memory for the life of the process
  Memory,
  /// Nothing is stored
  None,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend: CacheBackend,
  /// Database path for the sqlite backend (defaults to $XDG_DATA_HOME/stapling/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
  pub user_agent: Option<String>,
  /// Name of the query parameter appended to defeat HTTP caching
  pub cache_param: String,
  /// Base that relative resource URLs are resolved against
  #[serde(deserialize_with = "deserialize_base_url")]
  pub base_url: Option<Url>,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      user_agent: None,
      cache_param: DEFAULT_CACHE_PARAM.to_string(),
      base_url: None,
    }
  }
}

fn deserialize_base_url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  raw
    .map(|s| Url::parse(&s).map_err(serde::de::Error::custom))
    .transpose()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./stapling.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/stapling/config.yaml
  ///
  /// Without any file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("stapling.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("stapling").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert!(config.cachable);
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.http.cache_param, "cache");
    assert!(config.http.base_url.is_none());
  }

  #[test]
  fn test_empty_file_is_defaults() {
    let config = Config::from_yaml("").unwrap();
    assert!(config.cachable);
  }

  #[test]
  fn test_partial_file() {
    let config = Config::from_yaml(
      "cachable: false\n\
       cache:\n  backend: memory\n\
       http:\n  base_url: https://example.com/app/\n",
    )
    .unwrap();

    assert!(!config.cachable);
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.http.cache_param, "cache");
    assert_eq!(
      config.http.base_url.as_ref().map(Url::as_str),
      Some("https://example.com/app/")
    );
  }

  #[test]
  fn test_invalid_base_url_is_rejected() {
    assert!(Config::from_yaml("http:\n  base_url: not a url\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/stapling.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
