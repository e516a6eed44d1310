// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Processing configuration loaded from environment variables.

use panodepth_core::{EdgePolicy, SegmentConfig};
use panodepth_geometry::{PointCloudConfig, TessellationConfig};
use std::str::FromStr;

/// Processing configuration.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Segmentation settings passed to the depth decoder.
    pub segment: SegmentConfig,
    /// Shard grid resolution.
    pub tessellation: TessellationConfig,
    /// Point cloud sampling grid.
    pub point_cloud: PointCloudConfig,
    /// Number of worker threads for parallel decoding.
    pub worker_threads: usize,
    /// Directory for the on-disk depth cache.
    pub cache_dir: String,
    /// Rotate geometry by each panorama's capture heading.
    pub apply_heading: bool,
}

impl ProcessingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from any variable lookup, falling back to
    /// defaults for missing or unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tessellation = TessellationConfig::default();
        let point_cloud = PointCloudConfig::default();

        Self {
            segment: SegmentConfig {
                edge_policy: parse_or(&lookup, "PANODEPTH_EDGE_POLICY", EdgePolicy::default()),
            },
            tessellation: TessellationConfig {
                column_density: parse_or(
                    &lookup,
                    "PANODEPTH_COLUMN_DENSITY",
                    tessellation.column_density,
                ),
                row_density: parse_or(&lookup, "PANODEPTH_ROW_DENSITY", tessellation.row_density),
                ..tessellation
            },
            point_cloud: PointCloudConfig {
                rays_lng: parse_or(&lookup, "PANODEPTH_RAYS_LNG", point_cloud.rays_lng),
                rays_lat: parse_or(&lookup, "PANODEPTH_RAYS_LAT", point_cloud.rays_lat),
                ..point_cloud
            },
            worker_threads: parse_or(&lookup, "PANODEPTH_WORKER_THREADS", num_cpus::get()),
            cache_dir: lookup("PANODEPTH_CACHE_DIR").unwrap_or_else(|| "./.cache".into()),
            apply_heading: parse_or(&lookup, "PANODEPTH_APPLY_HEADING", false),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
                default
            }
        },
        None => default,
    }
}
