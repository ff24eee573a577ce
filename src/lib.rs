//! Render JSON through XML templates.
//!
//! JSON is serialized into a fixed XML shape (see [`xml`]), the template is
//! fetched or taken from the cache, and both go through a [`TemplateEngine`].
//! Service responses and templates are cached by URL in a [`KeyValueStore`];
//! hooks registered on a [`Stapler`] can veto parses and requests.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hooks;
pub mod render;
pub mod stapler;
pub mod xml;

pub use cache::{ConfiguredStore, KeyValueStore, MemoryStore, NoopStore, Resources, SqliteStore};
pub use config::Config;
pub use error::{FetchError, StaplingError};
pub use fetch::{HttpFetcher, TextFetcher};
pub use hooks::{HookContext, HookEvent, HookRegistry};
pub use render::{EchoEngine, TemplateEngine};
pub use stapler::{Stapled, Stapler};
