//! HTTP text client.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;

use crate::config::HttpConfig;
use crate::error::FetchError;

/// Reads the body of a URL as text.
///
/// Only a successful (2xx) response counts; anything else is a
/// [`FetchError::Status`].
pub trait TextFetcher: Send + Sync {
  fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// reqwest-based fetcher
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new(config: &HttpConfig) -> Result<Self> {
    let mut builder = reqwest::Client::builder();
    if let Some(user_agent) = &config.user_agent {
      builder = builder.user_agent(user_agent.clone());
    }

    let client = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl TextFetcher for HttpFetcher {
  async fn fetch(&self, url: &str) -> Result<String, FetchError> {
    let transport = |e: reqwest::Error| FetchError::Transport {
      url: url.to_string(),
      source: Box::new(e),
    };

    let response = self.client.get(url).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    response.text().await.map_err(transport)
  }
}
