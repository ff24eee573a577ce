//! Network reads of resources.
//!
//! Every read goes through the `request` hooks first and carries a
//! timestamp query parameter so that HTTP intermediaries don't cache what the
//! application layer caches itself.

mod client;

use chrono::Utc;
use std::sync::Arc;
use url::Url;

use crate::error::FetchError;
use crate::hooks::{HookContext, HookRegistry};

pub use client::{HttpFetcher, TextFetcher};

/// Default name of the cache-busting query parameter.
pub const DEFAULT_CACHE_PARAM: &str = "cache";

/// Append `param=stamp` to `url`, with `?` or `&` depending on whether the
/// URL already has a query.
pub fn cache_busted(url: &str, param: &str, stamp: i64) -> String {
  let operator = if url.contains('?') { '&' } else { '?' };
  format!("{url}{operator}{param}={stamp}")
}

/// Fetches resources on behalf of the orchestrator.
pub struct Fetcher<F: TextFetcher> {
  inner: F,
  hooks: Arc<HookRegistry>,
  cache_param: String,
  base_url: Option<Url>,
}

impl<F: TextFetcher> Fetcher<F> {
  pub fn new(inner: F, hooks: Arc<HookRegistry>) -> Self {
    Self {
      inner,
      hooks,
      cache_param: DEFAULT_CACHE_PARAM.to_string(),
      base_url: None,
    }
  }

  /// Set the name of the cache-busting query parameter.
  pub fn with_cache_param(mut self, param: impl Into<String>) -> Self {
    self.cache_param = param.into();
    self
  }

  /// Resolve relative resource URLs against `base`.
  pub fn with_base_url(mut self, base: Option<Url>) -> Self {
    self.base_url = base;
    self
  }

  /// The underlying client.
  pub fn inner(&self) -> &F {
    &self.inner
  }

  /// Fetch the text of `url`.
  ///
  /// Returns `Ok(None)` without touching the network when a `request` hook
  /// vetoes the read. Errors report `url` as given, without the cache-busting
  /// parameter. Failures are not retried.
  pub async fn fetch_text(&self, url: &str) -> Result<Option<String>, FetchError> {
    if !self.hooks.should_proceed(&HookContext::Request { url }) {
      return Ok(None);
    }

    let target = cache_busted(
      &self.resolve(url),
      &self.cache_param,
      Utc::now().timestamp_millis(),
    );
    tracing::info!(url, "Fetching resource");

    let body = self
      .inner
      .fetch(&target)
      .await
      .map_err(|e| e.with_url(url))?;

    tracing::debug!(url, bytes = body.len(), "Fetched resource");
    Ok(Some(body))
  }

  /// Join a relative URL onto the base URL, if there is one.
  fn resolve(&self, url: &str) -> String {
    if Url::parse(url).is_ok() {
      return url.to_string();
    }

    match &self.base_url {
      Some(base) => match base.join(url) {
        Ok(joined) => joined.to_string(),
        Err(e) => {
          tracing::debug!(url, "Could not resolve against base URL: {}", e);
          url.to_string()
        }
      },
      None => url.to_string(),
    }
  }
}
