//! Persistence of rendered component invocations.
//!
//! Every render records `element id -> (path, data, signature)` in a JSON
//! file. After a module reload the rebuilder replays these records to
//! produce fresh markup for each element still on screen.

mod store;

pub use store::{CacheError, CacheSnapshot, CacheStore, ComponentRecord};

/// Default cache file (relative to project root)
pub const DEFAULT_CACHE_FILE: &str = ".relax/components.json";
