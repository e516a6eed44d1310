// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk-based depth cache using cacache.

use panodepth_processing::{DepthCache, Error, Result};
use std::path::PathBuf;

/// Content-addressable disk cache.
#[derive(Debug, Clone)]
pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Create a new cache in the specified directory.
    pub fn new(cache_dir: &str) -> Self {
        let path = PathBuf::from(cache_dir);

        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create cache directory"
            );
        }

        Self { cache_dir: path }
    }
}

impl DepthCache for DiskCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match cacache::read_sync(&self.cache_dir, key) {
            Ok(data) => Ok(Some(data)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(Error::Cache(e.to_string())),
        }
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        cacache::write_sync(&self.cache_dir, key, bytes).map_err(|e| Error::Cache(e.to_string()))?;
        tracing::debug!(key = %key, size = bytes.len(), "Cached raw bytes");
        Ok(())
    }
}
