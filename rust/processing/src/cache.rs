// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key/value cache for raw provider responses.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Cache key under which a panorama's provider response is stored
pub fn depth_cache_key(pano_id: &str) -> String {
    format!("depth-{}", pano_id)
}

/// Byte store keyed by string.
///
/// Implementations must be shareable across the batch workers.
pub trait DepthCache: Send + Sync {
    /// Cached bytes for `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any previous entry
    fn set(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

impl<T: DepthCache + ?Sized> DepthCache for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).set(key, bytes)
    }
}

/// In-process cache, mostly for tests and one-shot runs
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DepthCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::Cache("memory cache lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Cache("memory cache lock poisoned".into()))?;
        entries.insert(key.to_string(), bytes.to_vec());
        tracing::debug!(key = %key, size = bytes.len(), "Cached raw bytes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_cache_key() {
        assert_eq!(depth_cache_key("abc123"), "depth-abc123");
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("missing").unwrap(), None);

        cache.set("depth-a", b"{}").unwrap();
        cache.set("depth-a", b"{\"model\":{}}").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("depth-a").unwrap().as_deref(), Some(&b"{\"model\":{}}"[..]));
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(MemoryCache::new());
        let shared: Arc<MemoryCache> = Arc::clone(&cache);
        shared.set("k", b"v").unwrap();
        assert_eq!(DepthCache::get(&cache, "k").unwrap(), Some(b"v".to_vec()));
    }
}
