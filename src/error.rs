//! Error types surfaced by the library.

/// A resource could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("the resource could not be fetched from '{url}': HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("the resource could not be fetched from '{url}': {source}")]
  Transport {
    url: String,
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl FetchError {
  /// The URL as the caller passed it, without the cache-busting parameter.
  pub fn url(&self) -> &str {
    match self {
      Self::Status { url, .. } | Self::Transport { url, .. } => url,
    }
  }

  /// Replace the URL the error reports.
  pub fn with_url(mut self, new_url: &str) -> Self {
    match &mut self {
      Self::Status { url, .. } | Self::Transport { url, .. } => *url = new_url.to_string(),
    }
    self
  }
}

/// Failures of a parse or load run.
#[derive(Debug, thiserror::Error)]
pub enum StaplingError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("invalid JSON from '{url}': {source}")]
  Json {
    url: String,
    source: serde_json::Error,
  },

  #[error("render failed: {0}")]
  Render(String),
}

pub type Result<T, E = StaplingError> = std::result::Result<T, E>;
