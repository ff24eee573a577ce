//! Best-effort caching of fetched resources.
//!
//! Resources (service responses and templates alike) are stored as raw text
//! keyed by the URL they were requested with. Entries never expire; they go
//! away only when cleared explicitly. Storage failures are swallowed so the
//! cache stays advisory.

mod layer;
mod storage;
mod traits;

pub use layer::StoreAdapter;
pub use storage::{ConfiguredStore, MemoryStore, NoopStore, SqliteStore};
pub use traits::{CacheSource, KeyValueStore, Resources};
