// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded depth field
//!
//! Runs the whole pipeline: payload → header → plane table → depth projection
//! → column-scan segmentation → annotation. No partial field is ever returned;
//! every check happens before the first derived value is computed.

use crate::annotate::{annotate, include_shard, PlaneRecord};
use crate::error::Result;
use crate::header::{parse_header, Header};
use crate::payload::decode_payload;
use crate::planes::{parse_plane_table, Plane};
use crate::projection::{is_sky, project_depths};
use crate::segment::{ColumnScanSegmenter, SegmentConfig, Shard};
use std::time::Instant;

/// Per-pixel depth, plane assignment and the shards derived from them
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthField {
    pub header: Header,
    pub width: u32,
    pub height: u32,
    /// Row-major depth per pixel
    pub depth_map: Vec<f32>,
    /// Row-major plane index per pixel
    pub indices: Vec<u8>,
    pub planes: Vec<PlaneRecord>,
    pub shards: Vec<Shard>,
    /// Pixels whose ray ran parallel to their plane
    pub degenerate_pixels: usize,
}

impl DepthField {
    /// Decode a provider payload string
    pub fn decode(payload: &str) -> Result<Self> {
        Self::decode_with_config(payload, &SegmentConfig::default())
    }

    pub fn decode_with_config(payload: &str, config: &SegmentConfig) -> Result<Self> {
        let raw = decode_payload(payload)?;
        tracing::debug!(
            encoded_len = payload.len(),
            raw_len = raw.len(),
            "Inflated depth payload"
        );
        Self::parse_with_config(&raw, config)
    }

    /// Parse an already inflated depth buffer
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_with_config(raw, &SegmentConfig::default())
    }

    pub fn parse_with_config(raw: &[u8], config: &SegmentConfig) -> Result<Self> {
        let start = Instant::now();

        let header = parse_header(raw)?;
        let table = parse_plane_table(raw, &header)?;
        let width = header.width as u32;
        let height = header.height as u32;
        tracing::debug!(
            width,
            height,
            planes = header.number_of_planes,
            "Parsed depth header"
        );

        let projection = project_depths(width, height, &table.indices, &table.planes);
        let mut shards = ColumnScanSegmenter::new(width, height, &table.indices, &table.planes)
            .with_config(*config)
            .segment();
        let planes = annotate(&table.planes, &mut shards);

        tracing::debug!(
            shards = shards.len(),
            degenerate_pixels = projection.degenerate_pixels,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Built depth field"
        );

        Ok(Self {
            header,
            width,
            height,
            depth_map: projection.depths,
            indices: table.indices,
            planes,
            shards,
            degenerate_pixels: projection.degenerate_pixels,
        })
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Depth at a pixel, `None` outside the raster
    #[inline]
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.offset(x, y).map(|i| self.depth_map[i])
    }

    /// Plane index at a pixel, `None` outside the raster
    #[inline]
    pub fn plane_index_at(&self, x: u32, y: u32) -> Option<u8> {
        self.offset(x, y).map(|i| self.indices[i])
    }

    /// Whether the pixel sees no surface
    pub fn is_sky_at(&self, x: u32, y: u32) -> bool {
        self.depth_at(x, y).map_or(true, is_sky)
    }

    /// Plane geometry by index
    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index).map(|record| &record.plane)
    }

    /// First shard of `plane_idx` whose horizontal run covers column `x`
    pub fn shard_at(&self, plane_idx: usize, x: u32) -> Option<&Shard> {
        let record = self.planes.get(plane_idx)?;
        record
            .shards
            .iter()
            .map(|&i| &self.shards[i])
            .find(|shard| shard.x0 <= x && x <= shard.x1)
    }

    /// Shards that pass [`include_shard`], with their indices
    pub fn included_shards(&self) -> impl Iterator<Item = (usize, &Shard)> {
        self.shards
            .iter()
            .enumerate()
            .filter(|(_, shard)| include_shard(shard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PayloadBuilder;
    use crate::error::Error;
    use crate::projection::SKY_DEPTH;

    fn two_wall_builder() -> PayloadBuilder {
        let mut builder = PayloadBuilder::new(16, 8);
        let left = builder.add_plane([1.0, 0.0, 0.0], 5.0);
        let right = builder.add_plane([0.0, 1.0, 0.0], 8.0);
        builder.fill(left, 0..=6, 1..=6);
        builder.fill(right, 9..=15, 2..=5);
        builder
    }

    #[test]
    fn test_decode_matches_parse() {
        let builder = two_wall_builder();
        let from_payload = DepthField::decode(&builder.to_payload().unwrap()).unwrap();
        let from_raw = DepthField::parse(&builder.to_bytes()).unwrap();
        assert_eq!(from_payload, from_raw);
    }

    #[test]
    fn test_accessors() {
        let field = DepthField::parse(&two_wall_builder().to_bytes()).unwrap();

        assert_eq!(field.plane_index_at(3, 3), Some(1));
        assert_eq!(field.plane_index_at(7, 3), Some(0));
        assert_eq!(field.plane_index_at(16, 0), None);
        assert_eq!(field.depth_at(7, 3), Some(SKY_DEPTH));
        assert!(field.is_sky_at(7, 3));
        assert!(!field.is_sky_at(3, 3));
        assert!(field.is_sky_at(100, 100));

        assert_eq!(field.shard_at(1, 4).map(|s| s.x1), Some(6));
        assert!(field.shard_at(1, 7).is_none());
        assert_eq!(field.shard_at(2, 15).map(|s| s.x0), Some(9));
        assert!(field.shard_at(9, 0).is_none());
    }

    #[test]
    fn test_included_shards() {
        let mut builder = two_wall_builder();
        let sliver = builder.add_plane([0.0, 0.6, 0.8], 3.0);
        builder.fill(sliver, 7..=8, 0..=0);
        let field = DepthField::parse(&builder.to_bytes()).unwrap();

        assert_eq!(field.shards.len(), 3);
        let included: Vec<u32> = field.included_shards().map(|(_, s)| s.plane_idx).collect();
        assert_eq!(included, vec![1, 2]);
    }

    #[test]
    fn test_bad_payload_yields_no_field() {
        assert!(matches!(DepthField::decode("!!!"), Err(Error::Decode(_))));

        let mut raw = two_wall_builder().to_bytes();
        raw.truncate(raw.len() - 1);
        assert!(matches!(DepthField::parse(&raw), Err(Error::MalformedHeader(_))));
    }
}
