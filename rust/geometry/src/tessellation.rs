// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shard tessellation
//!
//! A shard is rebuilt as a grid of vertical vertex columns. Its horizontal
//! extent runs between the plane points at the left and right edge columns
//! (both sampled on the horizon row), its vertical extent is taken from the
//! tallest column span. Each vertex carries a panorama UV so the grid can be
//! textured straight from the equirectangular image.

use crate::error::Result;
use crate::projector::{local_plane_point, GeometryProjector};
use nalgebra::{Point2, Point3};
use panodepth_core::{include_shard, Rgb, Shard};
use rayon::prelude::*;
use std::f64::consts::{PI, TAU};
use std::time::Instant;

const MIN_COLUMN_DEPTH: f64 = 1e-9;

/// Grid resolution for shard tessellation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationConfig {
    /// Columns across the full panorama width
    pub column_density: f64,
    /// Rows across the full panorama height
    pub row_density: f64,
    pub min_columns: usize,
    pub min_rows: usize,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            column_density: 64.0,
            row_density: 16.0,
            min_columns: 1,
            min_rows: 1,
        }
    }
}

impl TessellationConfig {
    /// Column and row count for a shard in a `width` x `height` raster
    pub fn grid_size(&self, shard: &Shard, width: u32, height: u32) -> (usize, usize) {
        let cols = (shard.w as f64 / width as f64 * self.column_density).ceil() as usize;
        let rows = (shard.h_max as f64 / height as f64 * self.row_density).ceil() as usize;
        (cols.max(self.min_columns.max(1)), rows.max(self.min_rows.max(1)))
    }
}

/// Vertex grid of one shard, column-major: vertex `col * (rows + 1) + row`
#[derive(Debug, Clone, PartialEq)]
pub struct ShardGrid {
    pub cols: usize,
    pub rows: usize,
    pub ci: Option<u32>,
    pub rgb: Rgb,
    pub vertices: Vec<Point3<f64>>,
    pub uvs: Vec<Point2<f64>>,
}

impl ShardGrid {
    /// Vertex at a grid position
    #[inline]
    pub fn vertex(&self, col: usize, row: usize) -> Option<&Point3<f64>> {
        if col > self.cols || row > self.rows {
            return None;
        }
        self.vertices.get(col * (self.rows + 1) + row)
    }
}

/// Plane points framing a shard
#[derive(Debug, Clone, Copy)]
struct ShardCorners {
    top: Point3<f64>,
    bottom: Point3<f64>,
    left: Point3<f64>,
    right: Point3<f64>,
}

impl<'a> GeometryProjector<'a> {
    /// Tessellate one shard into a textured vertex grid
    pub fn tessellate_shard(&self, shard: &Shard) -> Result<ShardGrid> {
        let (depth, _) = self.require()?;
        let plane = shard.plane();
        let horizon = (depth.height - 1) as f64 / 2.0;
        let corners = ShardCorners {
            top: local_plane_point(depth, &plane, shard.hx as f64, shard.hy0 as f64),
            bottom: local_plane_point(depth, &plane, shard.hx as f64, shard.hy1 as f64),
            left: local_plane_point(depth, &plane, shard.x0 as f64, horizon),
            right: local_plane_point(depth, &plane, shard.x1 as f64, horizon),
        };

        let (cols, rows) = self.tessellation.grid_size(shard, depth.width, depth.height);
        let span = corners.top.y - corners.bottom.y;
        let count = (cols + 1) * (rows + 1);
        let mut vertices = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);

        for col in 0..=cols {
            let t = col as f64 / cols as f64;
            let col_pos = corners.left.coords.lerp(&corners.right.coords, t);
            let col_depth = col_pos.x.hypot(col_pos.z);

            let mut uvx = col_pos.z.atan2(col_pos.x) / TAU;
            if uvx < 0.0 {
                uvx += 1.0;
            }

            for row in 0..=rows {
                let y = corners.top.y - span * row as f64 / rows as f64;
                let uvy = if col_depth > MIN_COLUMN_DEPTH {
                    (y / col_depth).atan() / PI + 0.5
                } else if y >= 0.0 {
                    1.0
                } else {
                    0.0
                };

                vertices.push(self.orient(Point3::new(col_pos.x, y, col_pos.z)));
                uvs.push(Point2::new(uvx, uvy));
            }
        }

        Ok(ShardGrid {
            cols,
            rows,
            ci: shard.ci,
            rgb: shard.rgb,
            vertices,
            uvs,
        })
    }

    /// Tessellate every shard that passes [`include_shard`], in parallel.
    ///
    /// Results keep shard order and carry the shard index.
    pub fn shard_meshes(&self) -> Result<Vec<(usize, ShardGrid)>> {
        let (depth, _) = self.require()?;
        let start = Instant::now();

        let candidates: Vec<(usize, &Shard)> = depth
            .shards
            .iter()
            .enumerate()
            .filter(|(_, shard)| include_shard(shard))
            .collect();

        let grids = candidates
            .par_iter()
            .map(|&(index, shard)| self.tessellate_shard(shard).map(|grid| (index, grid)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            shards = depth.shards.len(),
            tessellated = grids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tessellated shards"
        );
        Ok(grids)
    }
}
