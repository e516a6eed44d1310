// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for loading and batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading panoramas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Depth decoding error: {0}")]
    Core(#[from] panodepth_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] panodepth_geometry::Error),

    #[error("Invalid provider JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No depth map in provider response for {0}")]
    MissingDepthMap(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Not loaded: {0}")]
    NotLoaded(&'static str),
}
