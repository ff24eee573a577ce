//! The parse and load workflows.

use futures::future::join_all;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::{CacheSource, KeyValueStore, Resources, StoreAdapter};
use crate::config::Config;
use crate::error::{FetchError, Result, StaplingError};
use crate::fetch::{Fetcher, TextFetcher};
use crate::hooks::{HookContext, HookEvent, HookRegistry};
use crate::render::TemplateEngine;
use crate::xml;

/// Outcome of a workflow that hooks may cut short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stapled<T> {
  /// The workflow ran to completion
  Done(T),
  /// A hook for this event vetoed the workflow; nothing was rendered
  Aborted(HookEvent),
}

impl<T> Stapled<T> {
  pub fn done(self) -> Option<T> {
    match self {
      Self::Done(value) => Some(value),
      Self::Aborted(_) => None,
    }
  }

  pub fn is_aborted(&self) -> bool {
    matches!(self, Self::Aborted(_))
  }
}

/// Renders JSON through XML templates, caching templates and service data.
///
/// Each instance owns its hooks and its `cachable` flag, so independent
/// instances don't affect each other.
pub struct Stapler<E, F, S>
where
  E: TemplateEngine,
  F: TextFetcher,
  S: KeyValueStore,
{
  engine: E,
  fetcher: Fetcher<F>,
  cache: StoreAdapter<S>,
  hooks: Arc<HookRegistry>,
  cachable: AtomicBool,
}

impl<E, F, S> Stapler<E, F, S>
where
  E: TemplateEngine,
  F: TextFetcher,
  S: KeyValueStore,
{
  /// Create a stapler with caching enabled and default fetch settings.
  pub fn new(engine: E, fetcher: F, store: S) -> Self {
    let hooks = Arc::new(HookRegistry::new());
    Self {
      engine,
      fetcher: Fetcher::new(fetcher, Arc::clone(&hooks)),
      cache: StoreAdapter::new(store),
      hooks,
      cachable: AtomicBool::new(true),
    }
  }

  /// Create a stapler using the cache and HTTP settings from `config`.
  pub fn from_config(engine: E, fetcher: F, store: S, config: &Config) -> Self {
    let mut stapler = Self::new(engine, fetcher, store);
    stapler.fetcher = stapler
      .fetcher
      .with_cache_param(config.http.cache_param.clone())
      .with_base_url(config.http.base_url.clone());
    stapler.set_cachable(config.cachable);
    stapler
  }

  /// Whether fetched resources are stored and cached ones reused.
  pub fn is_cachable(&self) -> bool {
    self.cachable.load(Ordering::SeqCst)
  }

  /// Toggle caching. Takes effect for the next cache read or write.
  pub fn set_cachable(&self, cachable: bool) {
    self.cachable.store(cachable, Ordering::SeqCst);
  }

  /// Register a hook by event name (`parse` or `request`).
  ///
  /// Unknown event names are ignored; the return value tells whether the
  /// hook was registered.
  pub fn on<H>(&self, event: &str, hook: H) -> bool
  where
    H: Fn(&HookContext<'_>) -> bool + Send + Sync + 'static,
  {
    self.hooks.on(event, hook)
  }

  pub fn hooks(&self) -> &HookRegistry {
    &self.hooks
  }

  pub fn fetcher(&self) -> &Fetcher<F> {
    &self.fetcher
  }

  pub fn cache(&self) -> &StoreAdapter<S> {
    &self.cache
  }

  /// Whether the store can actually persist resources.
  pub fn is_supported(&self) -> bool {
    self.cache.is_supported()
  }

  /// Whether a resource is currently cached.
  pub fn is_cached(&self, url: &str) -> bool {
    self.cache.contains(url)
  }

  /// Remove one or many resources from the cache.
  pub fn clear(&self, resources: impl Into<Resources>) {
    self.cache.try_remove(resources);
  }

  /// The XML document the templates receive for `json`.
  pub fn xml_for(&self, json: &Value) -> String {
    xml::to_document_string(json)
  }

  /// Fetch resources ahead of time and store them.
  ///
  /// Resources are stored even when caching is switched off. Failed or
  /// vetoed fetches are logged and skipped. Returns how many were stored.
  pub async fn prefetch(&self, resources: impl Into<Resources>) -> usize {
    let resources = resources.into();

    let results = join_all(resources.iter().map(|url| async move {
      match self.fetcher.fetch_text(url).await {
        Ok(Some(text)) => {
          self.cache.try_set(url, &text);
          true
        }
        Ok(None) => false,
        Err(e) => {
          tracing::warn!(url, "Prefetch failed: {}", e);
          false
        }
      }
    }))
    .await;

    results.into_iter().filter(|stored| *stored).count()
  }

  /// Render `json` through the template at `template_url`.
  ///
  /// The `parse` hooks run before anything else. The template comes from the
  /// cache when caching is on and an entry exists, otherwise it is fetched
  /// (and stored, if caching is on).
  pub async fn parse(&self, json: &Value, template_url: &str) -> Result<Stapled<E::Fragment>> {
    let ctx = HookContext::Parse { json, template_url };
    if !self.hooks.should_proceed(&ctx) {
      return Ok(Stapled::Aborted(HookEvent::Parse));
    }

    let xml = xml::to_document_string(json);

    let Some((template, source)) = self.resource(template_url).await? else {
      return Ok(Stapled::Aborted(HookEvent::Request));
    };
    tracing::debug!(template_url, ?source, "Template ready");

    let data_doc = self.engine.parse_xml(&xml)?;
    let template_doc = self.engine.parse_xml(&template)?;

    let fragment = self.engine.render(&data_doc, &template_doc)?;
    Ok(Stapled::Done(fragment))
  }

  /// Load JSON from `service_url` and render it through `template_url`.
  ///
  /// The service response is cached under `service_url` like a template.
  pub async fn load(&self, service_url: &str, template_url: &str) -> Result<Stapled<E::Fragment>> {
    let Some((text, source)) = self.resource(service_url).await? else {
      return Ok(Stapled::Aborted(HookEvent::Request));
    };
    tracing::debug!(service_url, ?source, "Service data ready");

    let json: Value = serde_json::from_str(&text).map_err(|e| StaplingError::Json {
      url: service_url.to_string(),
      source: e,
    })?;

    self.parse(&json, template_url).await
  }

  /// Text of a resource, from the cache if allowed and present, else fetched.
  ///
  /// A fetched resource is stored before this returns, so no cache read can
  /// slip in between the fetch and the write. `None` means a `request` hook
  /// vetoed the fetch.
  async fn resource(
    &self,
    url: &str,
  ) -> std::result::Result<Option<(String, CacheSource)>, FetchError> {
    if self.is_cachable() {
      if let Some(text) = self.cache.try_get(url) {
        tracing::debug!(url, "Cache hit");
        return Ok(Some((text, CacheSource::Cache)));
      }
      tracing::debug!(url, "Cache miss");
    }

    let Some(text) = self.fetcher.fetch_text(url).await? else {
      return Ok(None);
    };

    if self.is_cachable() {
      self.cache.try_set(url, &text);
    }

    Ok(Some((text, CacheSource::Network)))
  }
}
