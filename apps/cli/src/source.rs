// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use panodepth_processing::{DepthSource, Error, Result};
use std::path::PathBuf;

/// Serves provider responses saved as `<dir>/<pano_id>.json`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DepthSource for DirectorySource {
    fn fetch(&self, pano_id: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(format!("{}.json", pano_id));
        std::fs::read(&path).map_err(|e| Error::Fetch(format!("{}: {}", path.display(), e)))
    }
}
