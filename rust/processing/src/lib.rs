// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # PanoDepth Processing
//!
//! Loading glue around the depth decoder: a cache-or-fetch [`DepthLoader`]
//! over pluggable [`DepthCache`] and [`DepthSource`] collaborators, panorama
//! assembly, parallel batch decoding and environment-driven configuration.

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod panorama;

pub use batch::{decode_batch, load_batch, DecodeOutcome, DecodeRequest};
pub use cache::{depth_cache_key, DepthCache, MemoryCache};
pub use config::ProcessingConfig;
pub use error::{Error, Result};
pub use loader::{decode_response, response_meta, DepthLoader, DepthSource, LoadOrigin};
pub use panorama::{Panorama, PanoramaMeta};
