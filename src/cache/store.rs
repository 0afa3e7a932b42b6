//! JSON-file component cache.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::Args;

/// A single recorded invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// `module.function` of the component
    pub path: String,
    /// Non-injected arguments as plain JSON
    pub data: Args,
    pub signature: String,
}

/// Contents of the store, keyed by element id.
pub type CacheSnapshot = BTreeMap<String, ComponentRecord>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write component cache `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize component cache")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed map of element id to [`ComponentRecord`].
///
/// Writes are serialized through a lock and land atomically (temp file
/// plus rename), so a concurrent reader sees either the old or the new
/// content. Reads never fail loudly: a missing or corrupt file reads as
/// "no cache".
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the store to `{}`.
    pub fn reset(&self) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock();
        self.write(&CacheSnapshot::new())?;
        crate::debug!("cache"; "reset {}", self.path.display());
        Ok(())
    }

    /// Insert or replace the record for `element_id`.
    pub fn record(&self, element_id: &str, record: ComponentRecord) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock();
        let mut records = self.load_all().unwrap_or_else(|| {
            crate::debug!("cache"; "unreadable store, starting from empty");
            CacheSnapshot::new()
        });
        records.insert(element_id.to_string(), record);
        self.write(&records)?;
        crate::debug!("cache"; "recorded {}", element_id);
        Ok(())
    }

    /// Read the whole store.
    ///
    /// Returns `None` when the file is missing or not valid JSON. A
    /// zero-length file (freshly truncated) reads as an empty map.
    pub fn load_all(&self) -> Option<CacheSnapshot> {
        let bytes = fs::read(&self.path).ok()?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Some(CacheSnapshot::new());
        }
        match serde_json::from_slice(&bytes) {
            Ok(records) => Some(records),
            Err(e) => {
                crate::debug!("cache"; "corrupt store {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write(&self, records: &CacheSnapshot) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(records)?;
        let io_err = |source: io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}
